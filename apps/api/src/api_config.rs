use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use motionwatch_application::HomeAutomationSettings;
use motionwatch_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_CALLMEBOT_API_URL: &str = "https://api.callmebot.com/whatsapp.php";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    ListModels,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    pub url: String,
    pub token: String,
    pub settings: HomeAutomationSettings,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_url: String,
    pub phone: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GcsConfig {
    pub bucket: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub api_host: String,
    pub api_port: u16,
    pub gemini: GeminiConfig,
    pub system_prompt_path: PathBuf,
    pub location_cooldown: Duration,
    pub image_fetch_timeout: Duration,
    pub debug_image_path: Option<PathBuf>,
    pub home_assistant: Option<HomeAssistantConfig>,
    pub voice_cooldown: Option<Duration>,
    pub sms: Option<SmsConfig>,
    pub sms_cooldown: Option<Duration>,
    pub gcs: Option<GcsConfig>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = env::args().nth(1);
        Self::from_lookup(command.as_deref(), |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(command: Option<&str>, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = EnvReader { lookup };

        let command = match command {
            None | Some("serve") => ApiCommand::Serve,
            Some("list-models") => ApiCommand::ListModels,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "unknown command '{other}', expected 'serve' or 'list-models'"
                )));
            }
        };

        let api_host = vars
            .optional("API_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_owned());
        let api_port = match vars.optional("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => 5427,
        };

        let gemini = GeminiConfig {
            api_key: vars
                .optional("GEMINI_API_KEY")
                .or_else(|| vars.optional("GOOGLE_API_KEY"))
                .ok_or_else(|| {
                    AppError::Validation("GEMINI_API_KEY or GOOGLE_API_KEY is required".to_owned())
                })?,
            model: vars
                .optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned()),
            base_url: vars
                .optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_owned()),
            timeout: vars.seconds("ANALYSIS_TIMEOUT_SECONDS", 60)?,
        };

        let home_assistant = match (vars.optional("HA_URL"), vars.optional("HA_TOKEN")) {
            (Some(url), Some(token)) => Some(HomeAssistantConfig {
                url,
                token,
                settings: HomeAutomationSettings {
                    announce_targets: vars
                        .optional("HA_ANNOUNCE_ENTITIES")
                        .map(|value| split_list(&value))
                        .unwrap_or_default(),
                    voice_enabled_entity: vars.optional("HA_VOICE_ENABLED_ENTITY"),
                    home_occupied_entity: vars.optional("HA_HOME_OCCUPIED_ENTITY"),
                    detection_counter_entity: vars.optional("HA_DETECTION_COUNTER_ENTITY"),
                    last_detection_entity: vars.optional("HA_LAST_DETECTION_ENTITY"),
                },
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "HA_URL and HA_TOKEN must be set together".to_owned(),
                ));
            }
        };

        let sms = if vars.flag("SMS_ENABLED") {
            Some(SmsConfig {
                api_url: vars
                    .optional("CALLMEBOT_API_URL")
                    .unwrap_or_else(|| DEFAULT_CALLMEBOT_API_URL.to_owned()),
                phone: vars.required("CALLMEBOT_PHONE")?,
                api_key: vars.required("CALLMEBOT_API_KEY")?,
            })
        } else {
            None
        };

        let gcs = match (vars.optional("GCS_BUCKET"), vars.optional("GCS_ACCESS_TOKEN")) {
            (Some(bucket), Some(access_token)) => Some(GcsConfig {
                bucket,
                access_token,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "GCS_BUCKET and GCS_ACCESS_TOKEN must be set together".to_owned(),
                ));
            }
        };

        Ok(Self {
            command,
            api_host,
            api_port,
            gemini,
            system_prompt_path: vars
                .optional("SYSTEM_PROMPT_PATH")
                .map_or_else(|| PathBuf::from("system_prompt.txt"), PathBuf::from),
            location_cooldown: vars.seconds("LOCATION_COOLDOWN_SECONDS", 30)?,
            image_fetch_timeout: vars.seconds("IMAGE_FETCH_TIMEOUT_SECONDS", 10)?,
            debug_image_path: vars.optional("DEBUG_IMAGE_PATH").map(PathBuf::from),
            home_assistant,
            voice_cooldown: vars.optional_seconds("VOICE_COOLDOWN_SECONDS")?,
            sms,
            sms_cooldown: vars.optional_seconds("SMS_COOLDOWN_SECONDS")?,
            gcs,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, AppError> {
        self.optional(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    fn flag(&self, name: &str) -> bool {
        self.optional(name)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    fn seconds(&self, name: &str, default: u64) -> Result<Duration, AppError> {
        Ok(self
            .optional_seconds(name)?
            .unwrap_or(Duration::from_secs(default)))
    }

    fn optional_seconds(&self, name: &str) -> Result<Option<Duration>, AppError> {
        self.optional(name)
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
            })
            .transpose()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}
