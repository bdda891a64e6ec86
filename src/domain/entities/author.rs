use serde::{Deserialize, Serialize};

/// An author as returned by the author service. Ids are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}
