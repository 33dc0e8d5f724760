use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct HeadlinesEnvelope {
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) articles: Vec<ArticleNode>,
}

#[derive(Deserialize, Default)]
pub(crate) struct ArticleNode {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) source: Option<SourceNode>,
    #[serde(rename = "publishedAt")]
    pub(crate) published_at: Option<String>,
}

#[derive(Deserialize, Default)]
pub(crate) struct SourceNode {
    pub(crate) name: Option<String>,
}
