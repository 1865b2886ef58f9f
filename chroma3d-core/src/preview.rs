/// Preview session: one asset, one scene, one camera
///
/// The session owns the intake, the mounted scene root and the viewport
/// state. Front ends feed it files and pointer events and ask it to render
/// into a [`Framebuffer`] once per frame.
use crate::asset::UploadedAsset;
use crate::config::ViewerConfig;
use crate::error::{ConfigError, IntakeError, LoadError, PresetError, PreviewError};
use crate::format::ModelFormat;
use crate::framing::{fit_camera, AutoFramer};
use crate::guides::Guides;
use crate::intake::{AssetIntake, LocalRef, LocalReferences};
use crate::loader::load_scene;
use crate::material::{find_preset, Preset};
use crate::normalize::Normalization;
use crate::orbit::OrbitControls;
use crate::projection::Camera;
use crate::raster::{render_scene, Framebuffer, RenderStats};
use crate::scene::SceneRoot;

/// Wheel steps scale the orbit distance by this much
const WHEEL_ZOOM_STEP: f32 = 1.1;

#[derive(Debug, Clone)]
pub enum PreviewState {
    /// Nothing selected; the viewport shows the neutral placeholder
    Empty,
    /// A file was accepted and is waiting to be parsed
    Loading { file_name: String },
    Ready {
        file_name: String,
        scene: SceneRoot,
        normalization: Normalization,
    },
    /// The last accepted file could not be parsed
    Failed { file_name: String, message: String },
}

/// Handle for an asynchronous upload started with
/// [`PreviewSession::begin_upload`].
///
/// Every later selection supersedes it; finishing or failing a superseded
/// upload does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    pub format: ModelFormat,
    generation: u64,
}

pub struct PreviewSession<R: LocalReferences> {
    config: ViewerConfig,
    /// Bumped by every accepted selection, pending or immediate
    generation: u64,
    intake: AssetIntake<R>,
    state: PreviewState,
    preset: &'static Preset,
    camera: Camera,
    orbit: OrbitControls,
    framer: AutoFramer,
    notice: Option<String>,
}

impl<R: LocalReferences> PreviewSession<R> {
    pub fn new(config: ViewerConfig, references: R) -> Result<Self, ConfigError> {
        let preset = config.validate()?;
        Ok(Self {
            generation: 0,
            intake: AssetIntake::new(references),
            state: PreviewState::Empty,
            preset,
            camera: config.viewport.camera(),
            orbit: OrbitControls::new(config.orbit),
            framer: AutoFramer::new(config.framing),
            notice: None,
            config,
        })
    }

    /// Accept a file for loading.
    ///
    /// An unsupported file sets the inline notice and leaves everything else
    /// as it was, including the mounted scene.
    pub fn select(&mut self, asset: UploadedAsset) -> Result<ModelFormat, IntakeError> {
        match self.intake.select(asset) {
            Ok(accepted) => {
                let format = accepted.format;
                let file_name = accepted.asset.file_name.clone();
                self.generation += 1;
                self.notice = None;
                self.state = PreviewState::Loading { file_name };
                Ok(format)
            }
            Err(e) => {
                log::warn!("rejected file: {}", e);
                self.notice = Some(e.user_message().to_string());
                Err(e)
            }
        }
    }

    /// Check a file name before its bytes are available.
    ///
    /// Front ends that read files asynchronously call this first so an
    /// unsupported file is rejected without reading it, and a supported one
    /// shows the loading state while the read is pending. Reads can finish
    /// out of order, so the returned ticket goes back in with the bytes.
    pub fn begin_upload(&mut self, file_name: &str) -> Result<UploadTicket, IntakeError> {
        match ModelFormat::from_file_name(file_name) {
            Ok(format) => {
                self.generation += 1;
                self.notice = None;
                self.framer.cancel();
                self.state = PreviewState::Loading {
                    file_name: file_name.to_string(),
                };
                Ok(UploadTicket {
                    format,
                    generation: self.generation,
                })
            }
            Err(e) => {
                log::warn!("rejected file: {}", e);
                self.notice = Some(e.user_message().to_string());
                Err(e)
            }
        }
    }

    /// Whether `ticket` belongs to the most recent selection
    pub fn is_current(&self, ticket: UploadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Load the bytes of a pending upload.
    ///
    /// Returns `Ok(false)` without touching the session when a newer file
    /// was chosen while these bytes were being read.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        asset: UploadedAsset,
    ) -> Result<bool, PreviewError> {
        if !self.is_current(ticket) {
            log::debug!("dropping superseded upload {}", asset.file_name);
            return Ok(false);
        }
        self.select_and_load(asset)?;
        Ok(true)
    }

    /// Record that the bytes of a pending upload could not be read
    pub fn upload_failed(&mut self, ticket: UploadTicket, file_name: &str, message: &str) {
        if !self.is_current(ticket) {
            log::debug!("ignoring read failure of superseded upload {}", file_name);
            return;
        }
        log::warn!("failed to read {}: {}", file_name, message);
        self.orbit.set_model_loaded(false);
        self.state = PreviewState::Failed {
            file_name: file_name.to_string(),
            message: message.to_string(),
        };
    }

    /// Parse the accepted file and mount the result
    pub fn load_pending(&mut self) -> Result<(), LoadError> {
        let Some(accepted) = self.intake.current() else {
            return Err(LoadError::NothingSelected);
        };
        let file_name = accepted.asset.file_name.clone();

        match load_scene(accepted.format, &file_name, &accepted.asset.bytes) {
            Ok(scene) => {
                self.mount(file_name, scene);
                Ok(())
            }
            Err(e) => {
                log::warn!("failed to load {}: {}", file_name, e);
                self.state = PreviewState::Failed {
                    file_name,
                    message: e.to_string(),
                };
                self.framer.cancel();
                self.orbit.set_model_loaded(false);
                Err(e)
            }
        }
    }

    pub fn select_and_load(&mut self, asset: UploadedAsset) -> Result<(), PreviewError> {
        self.select(asset)?;
        self.load_pending()?;
        Ok(())
    }

    /// Replaces whatever scene was mounted before
    fn mount(&mut self, file_name: String, mut scene: SceneRoot) {
        scene.apply_preset(self.preset);
        let normalization = scene.normalize(&self.config.normalize);

        self.orbit.stop();
        self.orbit.set_model_loaded(true);
        self.camera.reset();
        self.framer.begin(&mut self.camera, &scene.bounds());

        self.state = PreviewState::Ready {
            file_name,
            scene,
            normalization,
        };
    }

    /// Drop the current file and its reference
    pub fn clear(&mut self) {
        self.generation += 1;
        self.intake.clear();
        self.state = PreviewState::Empty;
        self.notice = None;
        self.framer.cancel();
        self.orbit.stop();
        self.orbit.set_model_loaded(false);
        self.camera.reset();
    }

    /// Restyle the mounted scene without re-parsing it
    pub fn set_preset(&mut self, key: &str) -> Result<&'static Preset, PresetError> {
        let preset = find_preset(key)?;
        self.preset = preset;
        if let PreviewState::Ready { scene, .. } = &mut self.state {
            scene.apply_preset(preset);
        }
        log::debug!("preset set to {}", preset.key);
        Ok(preset)
    }

    /// Show or hide the grid and gizmo
    pub fn set_guides(&mut self, guides: Guides) {
        self.config.guides = guides;
    }

    /// Advance framing and orbit by one frame; returns whether the camera moved
    pub fn frame(&mut self, dt: f32) -> bool {
        let mut moved = false;
        if let PreviewState::Ready { scene, .. } = &self.state {
            moved |= self.framer.tick(&mut self.camera, &scene.bounds());
        }
        moved |= self.orbit.update(&mut self.camera, dt);
        moved
    }

    pub fn render(&self, target: &mut Framebuffer) -> RenderStats {
        render_scene(
            target,
            self.scene(),
            &self.camera,
            &self.config.lighting,
            &self.config.guides,
        )
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.orbit.pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let height = self.config.viewport.height as f32;
        self.orbit.pointer_move(x, y, height);
    }

    pub fn pointer_up(&mut self) {
        self.orbit.pointer_up();
    }

    /// Mouse wheel; does nothing unless zoom is enabled
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.orbit.zoom(WHEEL_ZOOM_STEP);
        } else if delta_y < 0.0 {
            self.orbit.zoom(1.0 / WHEEL_ZOOM_STEP);
        }
    }

    /// Queue a rotation in radians, as arrow keys do
    pub fn nudge(&mut self, left: f32, up: f32) {
        self.orbit.rotate(left, up);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.viewport.width = width.max(1);
        self.config.viewport.height = height.max(1);
        self.camera.set_viewport(width, height);
        if let PreviewState::Ready { scene, .. } = &self.state {
            fit_camera(&mut self.camera, &scene.bounds(), self.config.framing.margin);
        }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn scene(&self) -> Option<&SceneRoot> {
        match &self.state {
            PreviewState::Ready { scene, .. } => Some(scene),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn preset(&self) -> &'static Preset {
        self.preset
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn current_reference(&self) -> Option<&LocalRef> {
        self.intake.current().map(|accepted| &accepted.reference)
    }

    pub fn references(&self) -> &R {
        self.intake.references()
    }

    /// One-line summary for a status bar
    pub fn status_line(&self) -> String {
        match &self.state {
            PreviewState::Empty => format!("Drop a model to preview ({})", ModelFormat::ACCEPT),
            PreviewState::Loading { file_name } => format!("Loading {}...", file_name),
            PreviewState::Ready {
                file_name, scene, ..
            } => format!(
                "{} | {} | {} triangles",
                file_name,
                self.preset.name,
                scene.triangle_count()
            ),
            PreviewState::Failed { file_name, message } => {
                format!("Could not load {}: {}", file_name, message)
            }
        }
    }
}
