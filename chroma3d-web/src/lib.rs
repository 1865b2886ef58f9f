/// Chroma3D Web - WASM bindings for the model preview
///
/// Drives a [`PreviewSession`] from a browser page: files come from a file
/// input or drop zone, local references are blob URLs, and frames are
/// blitted onto a 2D canvas.
use std::cell::RefCell;
use std::rc::Rc;

use chroma3d_core::material::PRESETS;
use chroma3d_core::quote::{quote_message, ContactMessage};
use chroma3d_core::{
    Framebuffer, IntakeError, LocalRef, LocalReferences, PreviewSession, PreviewState,
    UploadTicket, UploadedAsset, ViewerConfig,
};
use js_sys::{Array, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Blob, CanvasRenderingContext2d, File, HtmlCanvasElement, ImageData, Response, Url};

/// Issues `blob:` URLs for accepted files and revokes them when superseded
#[derive(Debug, Default)]
pub struct BlobUrls;

impl LocalReferences for BlobUrls {
    fn issue(&mut self, asset: &UploadedAsset) -> Result<LocalRef, IntakeError> {
        let parts = Array::of1(&Uint8Array::from(&asset.bytes[..]));
        let blob = Blob::new_with_u8_array_sequence(&parts).map_err(reference_error)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(reference_error)?;
        Ok(LocalRef::new(url))
    }

    fn release(&mut self, reference: LocalRef) {
        if let Err(e) = Url::revoke_object_url(reference.as_str()) {
            log::warn!("failed to revoke {}: {:?}", reference, e);
        }
    }
}

fn reference_error(e: JsValue) -> IntakeError {
    IntakeError::Reference(format!("{:?}", e))
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

type SharedSession = Rc<RefCell<PreviewSession<BlobUrls>>>;

/// Last path segment of a URL, without query or fragment
fn file_name_from_url(url: &str) -> &str {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Browser preview bound to one canvas
#[wasm_bindgen]
pub struct WebPreview {
    session: SharedSession,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    framebuffer: Framebuffer,
}

#[wasm_bindgen]
impl WebPreview {
    /// Upload preview on the canvas with the given id
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebPreview, JsValue> {
        Self::with_config(canvas_id, ViewerConfig::default())
    }

    /// Turntable setup for the decorative hero sculpture
    pub fn showcase(canvas_id: &str) -> Result<WebPreview, JsValue> {
        Self::with_config(canvas_id, ViewerConfig::showcase())
    }

    /// Upload preview configured from a JSON string
    #[wasm_bindgen(js_name = withConfigJson)]
    pub fn with_config_json(canvas_id: &str, json: &str) -> Result<WebPreview, JsValue> {
        Self::with_config(canvas_id, ViewerConfig::from_json_str(json).map_err(to_js)?)
    }

    /// Value for the file input's `accept` attribute
    pub fn accept() -> String {
        chroma3d_core::ModelFormat::ACCEPT.to_string()
    }

    /// Read and preview a picked or dropped file.
    ///
    /// Unsupported names are rejected before the file is read; the promise
    /// rejects with the inline notice text. If another file is picked before
    /// this one has been read, this one is discarded.
    #[wasm_bindgen(js_name = selectFile)]
    pub fn select_file(&self, file: File) -> Promise {
        let session = self.session.clone();
        let file_name = file.name();
        let ticket = match session.borrow_mut().begin_upload(&file_name) {
            Ok(ticket) => ticket,
            Err(e) => return Promise::reject(&JsValue::from_str(e.user_message())),
        };

        future_to_promise(async move {
            let bytes = match JsFuture::from(file.array_buffer()).await {
                Ok(buffer) => Uint8Array::new(&buffer).to_vec(),
                Err(e) => {
                    session
                        .borrow_mut()
                        .upload_failed(ticket, &file_name, &format!("{:?}", e));
                    return Err(e);
                }
            };
            load_into(&session, ticket, file_name, bytes)
        })
    }

    /// Fetch a bundled model by URL and preview it
    #[wasm_bindgen(js_name = loadUrl)]
    pub fn load_url(&self, url: String) -> Promise {
        let session = self.session.clone();
        let file_name = file_name_from_url(&url).to_string();
        let ticket = match session.borrow_mut().begin_upload(&file_name) {
            Ok(ticket) => ticket,
            Err(e) => return Promise::reject(&JsValue::from_str(e.user_message())),
        };

        future_to_promise(async move {
            match fetch_bytes(&url).await {
                Ok(bytes) => load_into(&session, ticket, file_name, bytes),
                Err(e) => {
                    session
                        .borrow_mut()
                        .upload_failed(ticket, &file_name, &format!("{:?}", e));
                    Err(e)
                }
            }
        })
    }

    #[wasm_bindgen(js_name = setPreset)]
    pub fn set_preset(&self, key: &str) -> Result<(), JsValue> {
        self.session.borrow_mut().set_preset(key).map_err(to_js)?;
        Ok(())
    }

    /// The catalog as `{ key, name, color, metalness, roughness }` objects
    pub fn presets() -> Result<Array, JsValue> {
        let out = Array::new();
        for preset in PRESETS {
            let entry = Object::new();
            Reflect::set(&entry, &"key".into(), &preset.key.into())?;
            Reflect::set(&entry, &"name".into(), &preset.name.into())?;
            Reflect::set(&entry, &"color".into(), &preset.color.to_hex().into())?;
            Reflect::set(&entry, &"metalness".into(), &preset.metalness.into())?;
            Reflect::set(&entry, &"roughness".into(), &preset.roughness.into())?;
            out.push(&entry);
        }
        Ok(out)
    }

    #[wasm_bindgen(js_name = currentPreset)]
    pub fn current_preset(&self) -> String {
        self.session.borrow().preset().key.to_string()
    }

    /// Toggle the ground grid and the corner axis gizmo independently
    #[wasm_bindgen(js_name = setGuides)]
    pub fn set_guides(&self, grid: bool, gizmo: bool) {
        let mut session = self.session.borrow_mut();
        let mut guides = session.config().guides;
        guides.grid.enabled = grid;
        guides.gizmo.enabled = gizmo;
        session.set_guides(guides);
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, x: f32, y: f32) {
        self.session.borrow_mut().pointer_down(x, y);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f32, y: f32) {
        self.session.borrow_mut().pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self) {
        self.session.borrow_mut().pointer_up();
    }

    pub fn wheel(&self, delta_y: f32) {
        self.session.borrow_mut().wheel(delta_y);
    }

    /// Advance by `dt` seconds and draw; call from requestAnimationFrame
    pub fn frame(&mut self, dt: f32) -> Result<(), JsValue> {
        let mut session = self.session.borrow_mut();
        session.frame(dt);
        session.render(&mut self.framebuffer);

        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(self.framebuffer.as_rgba()),
            self.framebuffer.width() as u32,
            self.framebuffer.height() as u32,
        )?;
        self.context.put_image_data(&image, 0.0, 0.0)
    }

    /// Match the canvas backing store to a new CSS size
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.framebuffer.resize(width as usize, height as usize);
        self.session.borrow_mut().resize(width, height);
    }

    /// Drop the current model and revoke its blob URL
    pub fn clear(&self) {
        self.session.borrow_mut().clear();
    }

    pub fn notice(&self) -> Option<String> {
        self.session.borrow().notice().map(str::to_string)
    }

    pub fn status(&self) -> String {
        self.session.borrow().status_line()
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        matches!(self.session.borrow().state(), PreviewState::Loading { .. })
    }

    /// Blob URL of the file being previewed
    #[wasm_bindgen(js_name = currentUrl)]
    pub fn current_url(&self) -> Option<String> {
        self.session
            .borrow()
            .current_reference()
            .map(|reference| reference.to_string())
    }

    /// `{ mailto, whatsapp }` links for the contact form
    #[wasm_bindgen(js_name = quoteLinks)]
    pub fn quote_links(
        &self,
        name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Result<Object, JsValue> {
        let session = self.session.borrow();
        let contact = &session.config().contact;
        let body = match session.state() {
            PreviewState::Ready { file_name, .. } => Some(quote_message(file_name, session.preset())),
            _ => None,
        };
        let chat = ContactMessage {
            name,
            email,
            subject,
            message,
        };

        let links = Object::new();
        Reflect::set(&links, &"mailto".into(), &contact.mailto_link(body.as_deref()).into())?;
        Reflect::set(&links, &"whatsapp".into(), &contact.whatsapp_link(&chat).into())?;
        Ok(links)
    }
}

impl WebPreview {
    fn with_config(canvas_id: &str, mut config: ViewerConfig) -> Result<WebPreview, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()?;
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        config.viewport.width = canvas.width().max(1);
        config.viewport.height = canvas.height().max(1);
        let framebuffer = Framebuffer::new(
            config.viewport.width as usize,
            config.viewport.height as usize,
        );
        let session = PreviewSession::new(config, BlobUrls).map_err(to_js)?;
        log::info!("preview attached to #{}", canvas_id);

        Ok(WebPreview {
            session: Rc::new(RefCell::new(session)),
            canvas,
            context,
            framebuffer,
        })
    }
}

/// Resolves with the status line, or `false` when a newer pick won
fn load_into(
    session: &SharedSession,
    ticket: UploadTicket,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<JsValue, JsValue> {
    let mut session = session.borrow_mut();
    let mounted = session
        .finish_upload(ticket, UploadedAsset::new(file_name, bytes))
        .map_err(to_js)?;
    if !mounted {
        return Ok(JsValue::FALSE);
    }
    Ok(JsValue::from_str(&session.status_line()))
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "GET {} failed with status {}",
            url,
            response.status()
        )));
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Setup panic hook for better error messages in browser console
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).map_err(to_js)?;
    Ok(())
}
