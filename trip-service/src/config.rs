use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableNames {
    pub trips: String,
    pub plannings: String,
    pub days: String,
    pub steps: String,
    pub users: String,
    pub destinations: String,
}

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tables: TableNames,
    pub dynamodb_endpoint: Option<String>,
    pub sns_topic_arn: Option<String>,
    pub jwt_secret: String,
    pub route_prefix: String,
    pub port: u16,
    pub lambda: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

        let tables = TableNames {
            trips: table("TRIPS_TABLE", "bmg-trips"),
            plannings: table("PLANNINGS_TABLE", "bmg-trip-plannings"),
            days: table("DAYS_TABLE", "bmg-trip-days"),
            steps: table("STEPS_TABLE", "bmg-trip-steps"),
            users: table("USERS_TABLE", "bmg-users"),
            destinations: table("DESTINATIONS_TABLE", "bmg-destinations"),
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        // Behind API Gateway every route lives under the stage prefix
        let remove_base_path = lookup("REMOVE_BASE_PATH")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        let route_prefix = if remove_base_path { "" } else { "/Prod" }.to_string();

        let port: u16 = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: value.clone(),
            })?,
            None => 5555,
        };

        Ok(Self {
            tables,
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT"),
            sns_topic_arn: lookup("SNS_TOPIC_ARN").filter(|s| !s.is_empty()),
            jwt_secret,
            route_prefix,
            port,
            lambda: lookup("AWS_LAMBDA_RUNTIME_API").is_some(),
        })
    }
}
