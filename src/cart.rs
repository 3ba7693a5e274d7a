//! Dish selection and the order request body built from it.

use serde::Serialize;

use crate::stream::{ItemFields, Record, RecordKind};

/// Menu language assumed when the stream never reported one.
pub const FALLBACK_MENU_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub original_name: String,
    pub translated_name: String,
    pub price: String,
    pub description: String,
    /// Record this entry was picked from.
    pub sequence_id: u64,
}

/// One line of the order body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub original_name: String,
    pub name: String,
    pub price: String,
}

/// Body of `POST /api/generate-order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    /// Language the staff-facing section is written in.
    pub lang: String,
    /// Language of the confirmation section.
    pub user_lang: String,
    pub note: String,
}

impl OrderRequest {
    /// Build directly from dish names, e.g. from the command line.
    pub fn new(
        items: Vec<OrderLine>,
        menu_language: Option<&str>,
        user_language: &str,
        note: &str,
    ) -> Self {
        let lang = menu_language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(FALLBACK_MENU_LANGUAGE);
        Self {
            items,
            lang: lang.to_string(),
            user_lang: user_language.to_string(),
            note: note.trim().to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dish. Only ITEM records with all four fields qualify; picking
    /// the same record twice adds it twice.
    pub fn add(&mut self, record: &Record) -> bool {
        if record.kind != RecordKind::Item {
            return false;
        }
        let Some(fields) = ItemFields::parse(&record.payload) else {
            log::debug!("[ORDER] Not adding malformed item #{}", record.sequence_id);
            return false;
        };
        self.items.push(CartItem {
            original_name: fields.original_name,
            translated_name: fields.translated_name,
            price: fields.price,
            description: fields.description,
            sequence_id: record.sequence_id,
        });
        true
    }

    /// Remove every entry picked from `sequence_id`. Returns how many went.
    pub fn remove(&mut self, sequence_id: u64) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.sequence_id != sequence_id);
        before - self.items.len()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// `None` for an empty cart.
    pub fn order_request(
        &self,
        menu_language: Option<&str>,
        user_language: &str,
        note: &str,
    ) -> Option<OrderRequest> {
        if self.items.is_empty() {
            return None;
        }
        let lines = self
            .items
            .iter()
            .map(|item| OrderLine {
                original_name: item.original_name.clone(),
                name: item.translated_name.clone(),
                price: item.price.clone(),
            })
            .collect();
        Some(OrderRequest::new(lines, menu_language, user_language, note))
    }
}
