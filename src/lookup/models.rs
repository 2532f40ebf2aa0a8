use serde::Deserialize;

/// Song details as returned by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongDetail {
    // Some deployments of the service still send the misspelled key.
    #[serde(rename = "releaseDate", alias = "relaseDate")]
    pub release_date: String,
    pub text: String,
    pub link: String,
}
