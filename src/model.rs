use serde::{Deserialize, Deserializer, Serialize};

/// A saved link from Raindrop, with the user's own annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "_id", deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub highlights: Vec<Highlight>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

impl Bookmark {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RaindropPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Bookmark>,
}

/// Body sent to `POST /wp/v2/posts` and `POST /wp/v2/posts/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub status: String,
    pub excerpt: String,
    pub meta: PostMeta,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMeta {
    pub raindrop_id: String,
}

/// The only part of a WordPress post this service reads back.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: u64,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
