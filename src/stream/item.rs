//! ITEM payload fields: `<original> | <translated> | <price> | <note>`.

use serde::Serialize;

/// Price placeholder the model writes when the menu shows no price.
pub const NO_PRICE_PLACEHOLDER: &str = "暂无";
/// Description placeholder the model writes when it has nothing to say.
pub const NO_NOTE_PLACEHOLDER: &str = "暂无解读";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    pub original_name: String,
    pub translated_name: String,
    /// Raw price field, possibly empty or a placeholder.
    pub price: String,
    pub description: String,
}

impl ItemFields {
    /// Split on `|`. Anything past the third pipe stays in the description.
    /// Fewer than four fields is malformed.
    pub fn parse(payload: &str) -> Option<Self> {
        let mut parts = payload.splitn(4, '|').map(str::trim);
        let original_name = parts.next()?.to_string();
        let translated_name = parts.next()?.to_string();
        let price = parts.next()?.to_string();
        let description = parts.next()?.to_string();
        Some(Self {
            original_name,
            translated_name,
            price,
            description,
        })
    }

    /// Displayable price, `None` when empty or a placeholder.
    pub fn price(&self) -> Option<&str> {
        let price = self.price.as_str();
        (!price.is_empty() && price != NO_PRICE_PLACEHOLDER).then_some(price)
    }

    pub fn note(&self) -> Option<&str> {
        let note = self.description.as_str();
        (!note.is_empty() && note != NO_NOTE_PLACEHOLDER).then_some(note)
    }

    pub fn fields(&self) -> [&str; 4] {
        [
            self.original_name.as_str(),
            self.translated_name.as_str(),
            self.price.as_str(),
            self.description.as_str(),
        ]
    }
}

/// How an ITEM record should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ItemView {
    Structured(ItemFields),
    /// Malformed payload, shown as opaque text.
    Raw { text: String },
}

impl ItemView {
    pub fn from_payload(payload: &str) -> Self {
        match ItemFields::parse(payload) {
            Some(fields) => ItemView::Structured(fields),
            None => {
                log::debug!("[DECODE] Malformed ITEM kept as raw text: {}", payload);
                ItemView::Raw {
                    text: payload.to_string(),
                }
            }
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ItemView::Raw { .. })
    }

    pub fn fields(&self) -> Option<&ItemFields> {
        match self {
            ItemView::Structured(fields) => Some(fields),
            ItemView::Raw { .. } => None,
        }
    }
}
