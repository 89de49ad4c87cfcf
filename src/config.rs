//! Runtime configuration.
//!
//! Settings are layered: compiled defaults first, then environment
//! variables, then command line flags.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, crate_version, value_parser};

use crate::cards::{CardId, ResolvePolicy};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://agent-prod.studio.lyzr.ai/v3/inference/chat/";

/// Agent used when none is configured.
pub const DEFAULT_AGENT_ID: &str = "68df95d0ed4f542c5e8e100c";

/// Environment variable overriding the endpoint.
pub const ENV_ENDPOINT: &str = "QUOTE_CARDS_ENDPOINT";
/// Environment variable overriding the agent id.
pub const ENV_AGENT_ID: &str = "QUOTE_CARDS_AGENT_ID";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "QUOTE_CARDS_API_KEY";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT: &str = "QUOTE_CARDS_TIMEOUT_SECS";

/// Settings for one run of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config
{
    /// URL of the chat endpoint.
    pub endpoint: String,
    /// Agent asked for quotes.
    pub agent_id: String,
    /// Credential for the endpoint.
    pub api_key: Option<String>,
    /// Request timeout, `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// How overlapping results for one card are applied.
    pub resolve_policy: ResolvePolicy,
    /// Log file location, `None` uses the default.
    pub log_file: Option<PathBuf>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            agent_id: DEFAULT_AGENT_ID.to_owned(),
            api_key: None,
            timeout: None,
            resolve_policy: ResolvePolicy::default(),
            log_file: None,
        }
    }
}

impl Config
{
    /// Builds the configuration from the environment and parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an invalid value.
    pub fn load(matches: &ArgMatches) -> Result<Self>
    {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.apply_matches(matches);
        Ok(config)
    }

    /// Builds the configuration from defaults and the given variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout variable is not a whole number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENV_ENDPOINT)
        {
            config.endpoint = endpoint;
        }
        if let Some(agent_id) = lookup(ENV_AGENT_ID)
        {
            config.agent_id = agent_id;
        }
        config.api_key = lookup(ENV_API_KEY);

        if let Some(raw) = lookup(ENV_TIMEOUT)
        {
            let secs = raw
                .trim()
                .parse::<u64>()
                .context(format!("{ENV_TIMEOUT} must be a whole number of seconds"))?;
            config.timeout = timeout_from_secs(secs);
        }

        Ok(config)
    }

    /// Overrides settings with the flags present in `matches`.
    pub fn apply_matches(&mut self, matches: &ArgMatches)
    {
        if let Some(endpoint) = matches.get_one::<String>("endpoint")
        {
            self.endpoint.clone_from(endpoint);
        }
        if let Some(agent_id) = matches.get_one::<String>("agent-id")
        {
            self.agent_id.clone_from(agent_id);
        }
        if let Some(api_key) = matches.get_one::<String>("api-key")
        {
            self.api_key = Some(api_key.clone());
        }
        if let Some(&secs) = matches.get_one::<u64>("timeout")
        {
            self.timeout = timeout_from_secs(secs);
        }
        if matches.get_flag("last-resolved-wins")
        {
            self.resolve_policy = ResolvePolicy::LastResolved;
        }
        if let Some(path) = matches.get_one::<PathBuf>("log-file")
        {
            self.log_file = Some(path.clone());
        }
    }

    /// Checks that the configuration can be used to send requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an HTTP(S) URL or the agent id
    /// is empty.
    pub fn validate(&self) -> Result<()>
    {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://"))
        {
            bail!("Endpoint must be an http(s) URL, got {:?}", self.endpoint);
        }
        if self.agent_id.trim().is_empty()
        {
            bail!("Agent id must not be empty");
        }
        Ok(())
    }
}

/// Zero means no timeout.
const fn timeout_from_secs(secs: u64) -> Option<Duration>
{
    if secs == 0 { None } else { Some(Duration::from_secs(secs)) }
}

/// Command line definition.
#[must_use]
pub fn command() -> Command
{
    Command::new("quote_cards")
        .version(crate_version!())
        .about("Three cards, each fetching a motivational quote on demand")
        .after_help(format!(
            "Environment:\n  {ENV_API_KEY}  API key sent with every request\n  {ENV_ENDPOINT}  \
             Endpoint URL\n  {ENV_AGENT_ID}  Agent id\n  {ENV_TIMEOUT}  Request timeout in \
             seconds"
        ))
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .help("Inference endpoint URL")
                .value_name("URL"),
        )
        .arg(
            Arg::new("agent-id")
                .long("agent-id")
                .help("Agent that generates the quotes")
                .value_name("ID"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .help("API key (prefer the environment variable)")
                .value_name("KEY"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in seconds, 0 waits indefinitely")
                .value_name("SECS")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("last-resolved-wins")
                .long("last-resolved-wins")
                .help("Let a slower, older request overwrite the quote of a newer one")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write the log to this file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("clear-log")
                .long("clear-log")
                .help("Remove the log file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Print one quote for the card and exit")
                .value_name("CARD")
                .value_parser(value_parser!(CardId)),
        )
}
