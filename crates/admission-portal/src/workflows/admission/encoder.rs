//! Turns user-selected files into embedded [`FileAsset`]s without contacting a server.
//!
//! Every field owns a slot. A selection takes a ticket from the slot before encoding starts
//! and only the newest ticket for a field may write its result back, so a slow encode that
//! finishes after a newer selection is discarded instead of overwriting it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mime::Mime;
use tracing::{debug, warn};

use super::domain::{FileAsset, MimeClass};
use super::error::EncodingError;

/// File-input hint. Used for display only; selections outside the list are still encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptList {
    Images,
    ImagesOrPdf,
    Documents,
}

impl AcceptList {
    pub const fn html_accept(self) -> &'static str {
        match self {
            AcceptList::Images => "image/*",
            AcceptList::ImagesOrPdf => "image/*,.pdf",
            AcceptList::Documents => "image/*,.pdf,.doc,.docx",
        }
    }

    pub fn accepts(self, content_type: &Mime) -> bool {
        let is_image = content_type.type_() == mime::IMAGE;
        let is_pdf = content_type.essence_str() == mime::APPLICATION_PDF.essence_str();
        match self {
            AcceptList::Images => is_image,
            AcceptList::ImagesOrPdf => is_image || is_pdf,
            AcceptList::Documents => {
                is_image
                    || is_pdf
                    || content_type.essence_str() == "application/msword"
                    || content_type.essence_str()
                        == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

pub fn classify(content_type: &Mime) -> MimeClass {
    if content_type.type_() == mime::IMAGE {
        MimeClass::Image
    } else {
        MimeClass::Document
    }
}

/// Encode raw bytes as a `data:<type>;base64,<payload>` URL.
pub fn encode_bytes(
    field_name: &str,
    content_type: &Mime,
    bytes: &[u8],
) -> Result<FileAsset, EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::Empty {
            field: field_name.to_string(),
        });
    }

    let encoded_content = format!(
        "data:{};base64,{}",
        content_type.essence_str(),
        BASE64.encode(bytes)
    );

    Ok(FileAsset {
        field_name: field_name.to_string(),
        mime_class: classify(content_type),
        encoded_content,
    })
}

/// Read `path` and encode it, guessing the content type from the file extension.
pub async fn encode_file(field_name: &str, path: &Path) -> Result<FileAsset, EncodingError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| EncodingError::Unreadable {
            field: field_name.to_string(),
            source,
        })?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    encode_bytes(field_name, &content_type, &bytes)
}

/// Handle for one in-progress selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    field: String,
    generation: u64,
}

impl SelectionTicket {
    pub fn field(&self) -> &str {
        &self.field
    }
}

#[derive(Debug)]
pub enum SlotOutcome {
    Applied(FileAsset),
    /// A newer selection for the same field was started; this result was dropped.
    Superseded,
    /// The newest selection failed; the field now holds no file.
    Failed(EncodingError),
}

#[derive(Debug, Default)]
struct SlotState {
    generations: HashMap<String, u64>,
    assets: BTreeMap<String, FileAsset>,
}

/// Last-selection-wins storage of encoded files, keyed by field name.
#[derive(Debug, Default)]
pub struct AssetSlots {
    state: Mutex<SlotState>,
}

impl AssetSlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, field: &str) -> SelectionTicket {
        let mut state = self.lock();
        let generation = state.generations.entry(field.to_string()).or_insert(0);
        *generation += 1;
        SelectionTicket {
            field: field.to_string(),
            generation: *generation,
        }
    }

    pub fn complete(
        &self,
        ticket: SelectionTicket,
        result: Result<FileAsset, EncodingError>,
    ) -> SlotOutcome {
        let mut state = self.lock();
        let latest = state.generations.get(&ticket.field).copied().unwrap_or(0);
        if ticket.generation != latest {
            debug!(field = %ticket.field, "discarding superseded file selection");
            return SlotOutcome::Superseded;
        }

        match result {
            Ok(mut asset) => {
                asset.field_name = ticket.field.clone();
                state.assets.insert(ticket.field, asset.clone());
                SlotOutcome::Applied(asset)
            }
            Err(err) => {
                warn!(field = %ticket.field, error = %err, "file selection could not be encoded");
                state.assets.remove(&ticket.field);
                SlotOutcome::Failed(err)
            }
        }
    }

    /// Select and encode a file for `field`. Safe to run concurrently for several fields.
    pub async fn select_file(&self, field: &str, path: &Path) -> SlotOutcome {
        let ticket = self.begin(field);
        let result = encode_file(field, path).await;
        self.complete(ticket, result)
    }

    /// Store an already-encoded asset, superseding any selection still in flight.
    pub fn put(&self, asset: FileAsset) {
        let ticket = self.begin(&asset.field_name);
        let _ = self.complete(ticket, Ok(asset));
    }

    pub fn remove(&self, field: &str) {
        let mut state = self.lock();
        *state.generations.entry(field.to_string()).or_insert(0) += 1;
        state.assets.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<FileAsset> {
        self.lock().assets.get(field).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, FileAsset> {
        self.lock().assets.clone()
    }
}
