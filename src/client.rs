//! Main client: authenticated request execution with a bounded retry loop.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client as HttpClient, Request, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth;
use crate::config::{ClientConfig, Credentials};
use crate::error::{Error, Result};
use crate::params::{self, ParamValue, Params};
use crate::retry::{self, Disposition};

/// Rounds of clone fetching before [`Client::find_clones`] gives up on a
/// chain, in case the server ever hands back a clone cycle.
const CLONE_WALK_LIMIT: usize = 100;

/// A job record as returned by the jobs API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// The job's unique identifier.
    pub id: u64,
    /// The id of the job this one was cloned as, if any.
    #[serde(default)]
    pub clone_id: Option<u64>,
    /// Settings of this job as reported in the web UI.
    #[serde(default)]
    pub settings: HashMap<String, String>,
    /// Everything else the server sent, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A client for the openQA REST API. Handles API auth where needed,
/// retries transient failures, and provides a couple of convenience
/// methods on top.
///
/// All state is fixed at construction, so one instance can be shared
/// across threads freely; each call owns its own request and signature.
pub struct Client {
    base_url: Url,
    api_secret: Option<String>,
    max_attempts: usize,
    wait: Duration,
    transient_statuses: Vec<u16>,
    http: HttpClient,
}

impl Client {
    /// Creates a client for `server`, resolving scheme and credentials
    /// from the openQA config files.
    ///
    /// An empty `server` falls back to the first configured server, or
    /// `localhost` when no config exists. An empty `scheme` defaults to
    /// `http` for localhost and `https` for everything else.
    pub fn new(server: &str, scheme: &str) -> Result<Self> {
        Self::with_config(server, scheme, &ClientConfig::load())
    }

    /// Like [`Client::new`] but against an explicit, pre-loaded config.
    pub fn with_config(server: &str, scheme: &str, config: &ClientConfig) -> Result<Self> {
        let mut server = if server.is_empty() {
            config.first_server().unwrap_or("localhost").to_string()
        } else {
            server.to_string()
        };
        let mut scheme = scheme.to_string();

        // Entries like [https://foo] contribute scheme and host
        if server.starts_with("http") {
            let parsed = Url::parse(&server)
                .map_err(|e| Error::Config(format!("invalid server {:?}: {}", server, e)))?;
            if scheme.is_empty() {
                scheme = parsed.scheme().to_string();
            }
            server = host_with_port(&parsed);
        }
        if scheme.is_empty() {
            // non-TLS for localhost: a cert is unlikely to be valid for
            // 'localhost' and there is no man in the middle
            scheme = match server.as_str() {
                "localhost" | "127.0.0.1" | "::1" => "http",
                _ => "https",
            }
            .to_string();
        }

        let base = format!("{}://{}", scheme, server);
        let credentials = config
            .credentials(&server)
            .or_else(|| config.credentials(&base));
        if credentials.is_none() {
            debug!(
                "No API key for {}: only GET requests will be allowed",
                server
            );
        }
        Self::build(&base, credentials)
    }

    /// Creates a client with explicit credentials, bypassing the config
    /// files entirely.
    pub fn with_credentials(base_url: &str, key: &str, secret: &str) -> Result<Self> {
        Self::build(
            base_url,
            Some(Credentials {
                key: key.to_string(),
                secret: secret.to_string(),
            }),
        )
    }

    /// Creates a credential-less client; only GET requests will work.
    pub fn anonymous(base_url: &str) -> Result<Self> {
        Self::build(base_url, None)
    }

    fn build(base_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {:?}: {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        // the server expects this literal, not a media type
        headers.insert(ACCEPT, HeaderValue::from_static("json"));
        let api_secret = match credentials {
            Some(credentials) => {
                let mut value = HeaderValue::from_str(&credentials.key)
                    .map_err(|e| Error::Config(format!("invalid API key: {}", e)))?;
                value.set_sensitive(true);
                headers.insert(auth::API_KEY_HEADER, value);
                Some(credentials.secret)
            }
            None => None,
        };

        let http = HttpClient::builder()
            .user_agent("openqa-client")
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_secret,
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            wait: Duration::from_secs(retry::DEFAULT_WAIT_SECS),
            transient_statuses: retry::DEFAULT_TRANSIENT_STATUSES.to_vec(),
            http,
        })
    }

    /// Caps the total number of attempts per request (at least one).
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the fixed wait between attempts.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Replaces the set of status codes treated as transient.
    pub fn retry_on(mut self, statuses: Vec<u16>) -> Self {
        self.transient_statuses = statuses;
        self
    }

    /// The resolved base URL, e.g. `https://openqa.example.org/`.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Whether this client can authenticate write requests.
    pub fn has_credentials(&self) -> bool {
        self.api_secret.is_some()
    }

    /// Performs an API request and decodes the response body.
    ///
    /// `path` is relative to `/api/v1/` unless it starts with a slash.
    /// `params` become the query string; `data` becomes an
    /// `application/x-www-form-urlencoded` body (use it instead of params
    /// when passing lots of settings). JSON is decoded as JSON; a YAML
    /// content type (which the server sends for some error paths) is
    /// decoded as YAML; anything else comes back as a string value, and
    /// HTTP 204 as null.
    #[tracing::instrument(skip(self, params, data))]
    pub fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&Params>,
        data: Option<&Params>,
    ) -> Result<Value> {
        let (response, attempts) = self.send(method, path, params, data)?;
        decode_body(response, attempts)
    }

    /// Performs an API request and returns the raw response for the
    /// caller to do whatever it likes with.
    #[tracing::instrument(skip(self, params, data))]
    pub fn request_raw(
        &self,
        method: Method,
        path: &str,
        params: Option<&Params>,
        data: Option<&Params>,
    ) -> Result<Response> {
        let (response, _) = self.send(method, path, params, data)?;
        Ok(response)
    }

    /// Sends the request, retrying transient failures with a fresh
    /// signature per attempt, until success, a terminal failure, or an
    /// exhausted attempt budget. Returns the response along with the
    /// number of attempts it took, for error reporting further down.
    fn send(
        &self,
        method: Method,
        path: &str,
        params: Option<&Params>,
        data: Option<&Params>,
    ) -> Result<(Response, usize)> {
        if method != Method::GET && self.api_secret.is_none() {
            return Err(Error::MissingCredentials {
                server: self.base_url.to_string(),
            });
        }

        let url = self.build_url(path, params)?;
        let form = data.map(params::encode);

        let mut last: Option<Error> = None;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                debug!(
                    "request failed, retrying in {:?} (attempt {}/{})",
                    self.wait, attempt, self.max_attempts
                );
                thread::sleep(self.wait);
            }

            let mut builder = self.http.request(method.clone(), url.clone());
            if let Some(form) = &form {
                builder = builder.form(form);
            }
            let mut request = builder
                .build()
                .map_err(|e| Error::Validation(format!("failed to build request: {}", e)))?;
            // never reuse a timestamp/signature pair across attempts
            self.sign(&mut request)?;

            match self.http.execute(request) {
                Ok(response) => {
                    match retry::classify(response.status(), &self.transient_statuses) {
                        Disposition::Success => return Ok((response, attempt)),
                        Disposition::Transient => {
                            last = Some(request_error(&method, response, attempt));
                        }
                        Disposition::Fatal => {
                            return Err(request_error(&method, response, attempt));
                        }
                    }
                }
                Err(e) => {
                    warn!("connection to {} failed: {}", url, e);
                    last = Some(Error::Connection {
                        url: url.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
        // max_attempts is clamped to >= 1, so at least one attempt ran
        Err(last.unwrap_or_else(|| Error::Validation("no request attempt was made".to_string())))
    }

    fn build_url(&self, path: &str, params: Option<&Params>) -> Result<Url> {
        // as with the reference client, relative paths are under /api/v1
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/api/v1/{}", path)
        };
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| Error::Validation(format!("invalid path {:?}: {}", path, e)))?;
        if let Some(params) = params {
            let pairs = params::encode(params);
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }
        Ok(url)
    }

    /// Attaches the microtime and hash headers when a secret is
    /// configured. Called once per attempt so each retry gets a fresh
    /// timestamp; the server rejects stale ones.
    fn sign(&self, request: &mut Request) -> Result<()> {
        let Some(secret) = &self.api_secret else {
            return Ok(());
        };
        let canonical = auth::canonical_path(request.url());
        let microtime = auth::microtime();
        let hash = auth::sign(&canonical, &microtime, secret)?;
        let headers = request.headers_mut();
        headers.insert(
            auth::MICROTIME_HEADER,
            HeaderValue::from_str(&microtime).map_err(|e| Error::Signature(e.to_string()))?,
        );
        headers.insert(
            auth::HASH_HEADER,
            HeaderValue::from_str(&hash).map_err(|e| Error::Signature(e.to_string()))?,
        );
        Ok(())
    }

    /// Fetches job records. Either `jobs` (a list of job ids, fetched in
    /// one query) or `build` must be given; ids win when both are. With
    /// `filter_dupes`, cloned jobs are replaced by their clones (see
    /// [`Client::find_clones`]) and duplicates are filtered out via the
    /// upstream `latest` query parameter.
    #[tracing::instrument(skip(self))]
    pub fn get_jobs(
        &self,
        jobs: Option<&[u64]>,
        build: Option<&str>,
        filter_dupes: bool,
    ) -> Result<Vec<Job>> {
        let mut params = Params::new();
        match (jobs, build) {
            (Some(ids), _) if !ids.is_empty() => {
                params.insert(
                    "ids".to_string(),
                    ParamValue::Seq(ids.iter().map(u64::to_string).collect()),
                );
            }
            (_, Some(build)) => {
                params.insert("build".to_string(), ParamValue::from(build));
            }
            _ => {
                return Err(Error::Validation(
                    "either 'jobs' or 'build' must be specified".to_string(),
                ));
            }
        }
        if filter_dupes {
            // 'latest' only considers the jobs queried, so clones still
            // have to be substituted afterwards
            params.insert("latest".to_string(), ParamValue::Bool(true));
        }
        let body = self.request(Method::GET, "jobs", Some(&params), None)?;
        let jobs = jobs_from_body(&body)?;
        if filter_dupes {
            self.find_clones(jobs)
        } else {
            Ok(jobs)
        }
    }

    /// Replaces cloned jobs with the records of their clones. Recurses
    /// through clone chains, so if 3 was cloned as 4 and 4 as 5, you wind
    /// up with 5. If both a job and its clone are in the input, the
    /// original is dropped and the clone kept.
    pub fn find_clones(&self, jobs: Vec<Job>) -> Result<Vec<Job>> {
        let mut jobs = jobs;
        let mut rounds = 0;
        while jobs.iter().any(|job| job.clone_id.is_some()) {
            rounds += 1;
            if rounds > CLONE_WALK_LIMIT {
                warn!(
                    "clone chain still unresolved after {} rounds, giving up",
                    CLONE_WALK_LIMIT
                );
                break;
            }

            let known: Vec<u64> = jobs.iter().map(|job| job.id).collect();
            let mut kept = Vec::with_capacity(jobs.len());
            let mut toget = Vec::new();
            for job in jobs {
                match job.clone_id {
                    Some(clone_id) => {
                        debug!("Replacing job {} with clone {}", job.id, clone_id);
                        if !known.contains(&clone_id) {
                            toget.push(clone_id.to_string());
                        }
                    }
                    None => kept.push(job),
                }
            }
            jobs = kept;

            if !toget.is_empty() {
                let mut params = Params::new();
                params.insert("ids".to_string(), ParamValue::Seq(toget));
                let body = self.request(Method::GET, "jobs", Some(&params), None)?;
                jobs.extend(jobs_from_body(&body)?);
            }
        }
        Ok(jobs)
    }
}

fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Builds the terminal error for a non-2xx response, consuming the body.
fn request_error(method: &Method, response: Response, attempts: usize) -> Error {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    Error::Request {
        method: method.to_string(),
        url,
        status,
        body,
        attempts,
    }
}

/// Decodes a successful response body. JSON is the primary format; the
/// server sends YAML for certain error paths even when asked for JSON.
fn decode_body(response: Response, attempts: usize) -> Result<Value> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let url = response.url().to_string();
    let body = response.text().map_err(|e| Error::Connection {
        url,
        attempts,
        source: e,
    })?;

    if content_type.starts_with("text/yaml") || content_type.starts_with("application/yaml") {
        return Ok(serde_yaml::from_str(&body)?);
    }
    if content_type.contains("json") {
        return Ok(serde_json::from_str(&body)?);
    }
    // not a format we know how to decode; hand the text back
    Ok(Value::String(body))
}

fn jobs_from_body(body: &Value) -> Result<Vec<Job>> {
    let jobs = body.get("jobs").cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(jobs)?)
}
