use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("failed to build http client for {provider}")]
    Client { provider: String },
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
    #[display("{provider} rejected the request: {code}")]
    Api { provider: String, code: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum DashboardError {
    #[display("failed to fetch {symbol} {interval}")]
    Fetch { symbol: String, interval: String },
    #[display("no data found for {symbol} {interval}")]
    NoData { symbol: String, interval: String },
    #[display("dashboard task for {symbol} {interval} did not complete")]
    Task { symbol: String, interval: String },
}

#[derive(Debug, Display, Error)]
pub enum ExportError {
    #[display("failed to create export file")]
    Create,
    #[display("failed to write csv record")]
    Write,
}

#[derive(Debug, Display, Error)]
pub enum RenderError {
    #[display("failed to write dashboard output")]
    Write,
    #[display("failed to serialize dashboard")]
    Serialize,
}
