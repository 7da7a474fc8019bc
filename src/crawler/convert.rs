//! Default converter for providers serving normalized JSON directly

use crate::anime::Anime;
use crate::crawler::traits::AnimeConverter;
use crate::Result;

/// Parses the raw artifact body as an [`Anime`] JSON document
///
/// Providers with bespoke markup get their own converter implementation;
/// this one covers API-style sources whose responses already carry the
/// normalized fields.
pub struct JsonAnimeConverter;

impl AnimeConverter for JsonAnimeConverter {
    fn convert(&self, _id: &str, raw: &str) -> Result<Anime> {
        Ok(serde_json::from_str(raw)?)
    }
}
