use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Domain types ────────────────────────────────────────────────────────────

/// A store record: its id and its string-valued fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub fields: HashMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// The signed-in user as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub id_token: Option<String>,
}

// ── Firestore REST wire types ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<FirestoreDocument>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirestoreDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FirestoreValue>,
}

/// Only string values are read; other value kinds deserialize to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

impl From<FirestoreDocument> for Document {
    fn from(doc: FirestoreDocument) -> Self {
        // name is projects/{p}/databases/{d}/documents/{collection}/{id}
        let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
        let fields = doc
            .fields
            .into_iter()
            .filter_map(|(k, v)| v.string_value.map(|s| (k, s)))
            .collect();
        Self { id, fields }
    }
}

impl From<&Document> for FirestoreDocument {
    fn from(doc: &Document) -> Self {
        Self {
            name: String::new(),
            fields: doc
                .fields
                .iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        FirestoreValue {
                            string_value: Some(v.clone()),
                        },
                    )
                })
                .collect(),
        }
    }
}
