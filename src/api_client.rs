use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::error::{FetchError, FetchResult};
use crate::model::{
    GoalsAddedGoalkeeper, GoalsAddedPlayer, GoalsAddedTeam, League, Player, Team,
};
use crate::observe::{RequestEvent, SharedObserver};
use crate::paginate::{PageSpec, fetch_all_pages};
use crate::query::GoalsAddedQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// One GET against an absolute URL. Non-2xx replies are returned, not raised.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> FetchResult<HttpReply>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> FetchResult<HttpReply> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|err| FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|err| FetchError::Transport {
            url: url.to_string(),
            message: format!("failed reading body: {err}"),
        })?;
        Ok(HttpReply { status, body })
    }
}

/// Read-only client for one league of the American Soccer Analysis API.
#[derive(Clone)]
pub struct AsaClient {
    base: String,
    league: League,
    pages: PageSpec,
    transport: Arc<dyn Transport>,
    observer: SharedObserver,
}

impl AsaClient {
    pub fn new(
        base: impl Into<String>,
        league: League,
        transport: Arc<dyn Transport>,
        observer: SharedObserver,
    ) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            league,
            pages: PageSpec::default(),
            transport,
            observer,
        }
    }

    /// Client over the shared blocking reqwest client, configured from `config`.
    pub fn from_config(
        config: &AppConfig,
        league: League,
        observer: SharedObserver,
    ) -> anyhow::Result<Self> {
        let client = crate::http_client::http_client(config.request_timeout)?;
        let transport = Arc::new(ReqwestTransport::new(client.clone()));
        Ok(Self::new(config.api_base.clone(), league, transport, observer).with_pages(PageSpec {
            page_size: config.page_size,
            max_pages: config.max_pages,
        }))
    }

    pub fn with_pages(mut self, pages: PageSpec) -> Self {
        self.pages = pages;
        self
    }

    pub fn get_teams(&self) -> FetchResult<Vec<Team>> {
        self.get_list("teams", &[])
    }

    /// Every player the league knows about, drained page by page.
    pub fn get_players(&self) -> FetchResult<Vec<Player>> {
        let path = "players";
        fetch_all_pages(path, self.pages, |offset| {
            let pairs = vec![("offset".to_string(), offset.to_string())];
            let page: Vec<Player> = self.get_list(path, &pairs)?;
            self.observer.observe(&RequestEvent::PageFetched {
                path: format!("{}/{path}", self.league.slug()),
                offset,
                items: page.len(),
            });
            Ok(page)
        })
    }

    pub fn get_players_goals_added(
        &self,
        query: &GoalsAddedQuery,
    ) -> FetchResult<Vec<GoalsAddedPlayer>> {
        self.get_list("players/goals-added", &query.to_pairs())
    }

    pub fn get_goalkeepers_goals_added(
        &self,
        query: &GoalsAddedQuery,
    ) -> FetchResult<Vec<GoalsAddedGoalkeeper>> {
        self.get_list("goalkeepers/goals-added", &query.to_pairs())
    }

    pub fn get_teams_goals_added(&self, query: &GoalsAddedQuery) -> FetchResult<Vec<GoalsAddedTeam>> {
        self.get_list("teams/goals-added", &query.to_pairs())
    }

    pub fn url_for(&self, path: &str, pairs: &[(String, String)]) -> FetchResult<String> {
        let raw = format!("{}/{}/{}", self.base, self.league.slug(), path);
        let url = if pairs.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, pairs)
        };
        url.map(String::from).map_err(|err| FetchError::Transport {
            url: raw,
            message: format!("invalid url: {err}"),
        })
    }

    fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: &[(String, String)],
    ) -> FetchResult<Vec<T>> {
        let url = self.url_for(path, pairs)?;
        self.observer
            .observe(&RequestEvent::Started { url: url.clone() });
        let started = Instant::now();

        let reply = match self.transport.get(&url) {
            Ok(reply) => reply,
            Err(err) => {
                self.observer.observe(&RequestEvent::Failed {
                    url: url.clone(),
                    status: None,
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        if !(200..300).contains(&reply.status) {
            let err = FetchError::Status {
                url: url.clone(),
                status: reply.status,
                body: truncate(&reply.body, 200),
            };
            self.observer.observe(&RequestEvent::Failed {
                url,
                status: Some(reply.status),
                message: err.to_string(),
            });
            return Err(err);
        }

        match parse_list_json::<T>(&reply.body) {
            Ok(items) => {
                self.observer.observe(&RequestEvent::Completed {
                    url,
                    status: reply.status,
                    items: Some(items.len()),
                    elapsed: started.elapsed(),
                });
                Ok(items)
            }
            Err(source) => {
                self.observer.observe(&RequestEvent::Failed {
                    url: url.clone(),
                    status: Some(reply.status),
                    message: source.to_string(),
                });
                Err(FetchError::Decode { url, source })
            }
        }
    }
}

/// Decode a JSON array body. Empty bodies and `null` are an empty list.
pub fn parse_list_json<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

fn truncate(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
