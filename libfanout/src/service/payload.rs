//! Draft to wire payload
//!
//! Local previews never leave the process: any item still marked local is
//! dropped here with a warning. Tags are re-normalized in case they were
//! entered as free text, and `**bold**` markup is rendered into Unicode
//! glyphs when a selected platform has no rich text.

use std::collections::BTreeMap;

use tracing::warn;

use crate::api::{CreatePostPayload, RecordStatus, WireMedia};
use crate::draft::Draft;
use crate::media::MediaRef;
use crate::platforms::ConstraintTable;
use crate::text;

/// Build the create-post body for `draft`
pub fn build_payload(
    draft: &Draft,
    constraints: &ConstraintTable,
    status: Option<RecordStatus>,
    scheduled_date: Option<String>,
) -> CreatePostPayload {
    let local = draft.media().items().iter().filter(|m| m.is_local).count();
    if local > 0 {
        warn!("Dropping {} media item(s) that are still uploading", local);
    }

    let images = draft
        .media()
        .remote_items()
        .enumerate()
        .map(|(order, media)| wire_media(media, order))
        .collect();

    let selected_accounts = draft
        .platforms()
        .iter()
        .filter_map(|platform| {
            let accounts: Vec<_> = draft.valid_accounts(platform).cloned().collect();
            (!accounts.is_empty()).then(|| (platform.clone(), accounts))
        })
        .collect::<BTreeMap<_, _>>();

    let content = if constraints.requires_plain_text(draft.platforms()) {
        text::render_bold_markup(draft.content())
    } else {
        draft.content().to_string()
    };

    CreatePostPayload {
        content,
        platforms: draft.platforms().iter().cloned().collect(),
        selected_accounts,
        images,
        hashtags: text::normalize_tag_list(draft.hashtags(), '#'),
        mentions: text::normalize_tag_list(draft.mentions(), '@'),
        metadata: draft.metadata().clone(),
        scheduled_date,
        status,
    }
}

fn wire_media(media: &MediaRef, order: usize) -> WireMedia {
    WireMedia {
        url: media.url.clone(),
        public_id: media.public_id.clone(),
        original_name: media.original_name.clone(),
        display_name: media.display_name.clone(),
        filename: media.filename.clone(),
        file_type: media.file_type,
        size: media.size,
        width: media.dimensions.map(|d| d.width),
        height: media.dimensions.map(|d| d.height),
        duration: media.duration,
        thumbnail_url: media.thumbnail_url.clone(),
        order,
    }
}
