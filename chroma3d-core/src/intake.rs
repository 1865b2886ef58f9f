/// Asset intake: suffix validation and local reference lifetime
///
/// The intake owns the local reference (a blob URL in the browser) of the
/// file currently being previewed. A reference is released exactly once:
/// when a newer file is accepted, when the intake is cleared, or when the
/// intake is dropped.
use std::collections::HashSet;
use std::fmt;

use crate::asset::UploadedAsset;
use crate::error::IntakeError;
use crate::format::ModelFormat;

/// A revocable handle the renderer can use to reach the file contents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalRef(String);

impl LocalRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform hook that issues and releases local references
pub trait LocalReferences {
    fn issue(&mut self, asset: &UploadedAsset) -> Result<LocalRef, IntakeError>;
    fn release(&mut self, reference: LocalRef);
}

/// Native reference issuer producing synthetic `blob:` handles
#[derive(Debug, Default)]
pub struct InMemoryReferences {
    next_id: u64,
    outstanding: HashSet<LocalRef>,
    released: usize,
}

impl InMemoryReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of references issued but not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_outstanding(&self, reference: &LocalRef) -> bool {
        self.outstanding.contains(reference)
    }

    /// Total number of releases seen so far
    pub fn released(&self) -> usize {
        self.released
    }
}

impl LocalReferences for InMemoryReferences {
    fn issue(&mut self, asset: &UploadedAsset) -> Result<LocalRef, IntakeError> {
        self.next_id += 1;
        let reference = LocalRef::new(format!("blob:chroma3d/{}", self.next_id));
        log::debug!("issued {} for {}", reference, asset.file_name);
        self.outstanding.insert(reference.clone());
        Ok(reference)
    }

    fn release(&mut self, reference: LocalRef) {
        if self.outstanding.remove(&reference) {
            self.released += 1;
        } else {
            log::warn!("released unknown reference {}", reference);
        }
    }
}

/// A file that passed the suffix check and owns a live local reference
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedAsset {
    pub asset: UploadedAsset,
    pub format: ModelFormat,
    pub reference: LocalRef,
}

/// Accepts files one at a time, keeping at most one reference alive
pub struct AssetIntake<R: LocalReferences> {
    references: R,
    current: Option<AcceptedAsset>,
}

impl<R: LocalReferences> AssetIntake<R> {
    pub fn new(references: R) -> Self {
        Self {
            references,
            current: None,
        }
    }

    /// Validate and accept a file.
    ///
    /// Rejected files leave the current asset and its reference untouched.
    pub fn select(&mut self, asset: UploadedAsset) -> Result<&AcceptedAsset, IntakeError> {
        let format = ModelFormat::from_file_name(&asset.file_name)?;
        let reference = self.references.issue(&asset)?;
        log::info!(
            "accepted {} ({} bytes, {})",
            asset.file_name,
            asset.len(),
            format
        );

        if let Some(old) = self.current.take() {
            self.references.release(old.reference);
        }

        Ok(self.current.insert(AcceptedAsset {
            asset,
            format,
            reference,
        }))
    }

    pub fn current(&self) -> Option<&AcceptedAsset> {
        self.current.as_ref()
    }

    /// Release the current reference, if any
    pub fn clear(&mut self) {
        if let Some(old) = self.current.take() {
            self.references.release(old.reference);
        }
    }

    pub fn references(&self) -> &R {
        &self.references
    }
}

impl<R: LocalReferences> Drop for AssetIntake<R> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> UploadedAsset {
        UploadedAsset::new(name, b"solid x\nendsolid x\n".to_vec())
    }

    #[test]
    fn test_accepts_supported_file() {
        let mut intake = AssetIntake::new(InMemoryReferences::new());
        let accepted = intake.select(asset("bracket.STL")).unwrap();
        assert_eq!(accepted.format, ModelFormat::Stl);
        assert_eq!(intake.references().outstanding(), 1);
    }

    #[test]
    fn test_superseded_reference_is_released() {
        let mut intake = AssetIntake::new(InMemoryReferences::new());
        let first = intake.select(asset("a.stl")).unwrap().reference.clone();
        let second = intake.select(asset("b.obj")).unwrap().reference.clone();

        assert_ne!(first, second);
        assert!(!intake.references().is_outstanding(&first));
        assert!(intake.references().is_outstanding(&second));
        assert_eq!(intake.references().outstanding(), 1);
        assert_eq!(intake.references().released(), 1);
    }

    #[test]
    fn test_rejection_keeps_current_asset() {
        let mut intake = AssetIntake::new(InMemoryReferences::new());
        let kept = intake.select(asset("a.glb")).unwrap().clone();

        let err = intake.select(asset("model.fbx")).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedFormat { .. }));
        assert_eq!(intake.current(), Some(&kept));
        assert_eq!(intake.references().outstanding(), 1);
        assert_eq!(intake.references().released(), 0);
    }

    #[test]
    fn test_clear_releases_once() {
        let mut intake = AssetIntake::new(InMemoryReferences::new());
        intake.select(asset("a.gltf")).unwrap();
        intake.clear();
        intake.clear();
        assert_eq!(intake.references().outstanding(), 0);
        assert_eq!(intake.references().released(), 1);
        assert!(intake.current().is_none());
    }

    /// Records releases in a shared log so drops can be observed
    struct Recording(std::rc::Rc<std::cell::RefCell<Vec<String>>>);

    impl LocalReferences for Recording {
        fn issue(&mut self, asset: &UploadedAsset) -> Result<LocalRef, IntakeError> {
            Ok(LocalRef::new(format!("blob:{}", asset.file_name)))
        }

        fn release(&mut self, reference: LocalRef) {
            self.0.borrow_mut().push(reference.to_string());
        }
    }

    #[test]
    fn test_drop_releases_outstanding_reference() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        {
            let mut intake = AssetIntake::new(Recording(log.clone()));
            intake.select(asset("a.stl")).unwrap();
            intake.select(asset("b.stl")).unwrap();
        }
        assert_eq!(*log.borrow(), vec!["blob:a.stl", "blob:b.stl"]);
    }
}
