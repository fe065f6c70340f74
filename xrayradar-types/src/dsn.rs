use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::project_id::{ParseProjectIdError, ProjectId};

/// Represents a dsn url parsing error.
#[derive(Debug, Error)]
pub enum ParseDsnError {
    /// raised on completely invalid urls or urls without a host
    #[error("no valid url provided")]
    InvalidUrl,
    /// raised if the scheme is invalid / unsupported
    #[error("no valid scheme")]
    InvalidScheme,
    /// raised if the project id is missing (last path segment)
    #[error("empty or missing project id")]
    NoProjectId,
    /// raised if the project id is invalid
    #[error("invalid project id")]
    InvalidProjectId(#[from] ParseProjectIdError),
}

/// Represents the scheme of an url http/https.
///
/// This holds schemes that are supported by the collector.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Scheme {
    /// unencrypted HTTP scheme (should not be used)
    Http,
    /// encrypted HTTPS scheme
    Https,
}

impl Scheme {
    /// Returns the default port for this scheme.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                Scheme::Https => "https",
                Scheme::Http => "http",
            }
        )
    }
}

/// Represents an xrayradar dsn of the form
/// `scheme://host[:port]/[.../]project_id`.
///
/// The project id is the last path segment; intermediate path segments are
/// accepted and discarded.  The server URL used for delivery is always
/// `scheme://host[:port]`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Dsn {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    project_id: ProjectId,
}

impl Dsn {
    /// Returns the scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }

    /// Returns the project_id.
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the base URL of the collector (`scheme://host[:port]`).
    pub fn server_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Returns the URL events are POSTed to
    /// (`{server_url}/api/{project_id}/store/`).
    pub fn store_api_url(&self) -> String {
        format!("{}/api/{}/store/", self.server_url(), self.project_id)
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "/{}", self.project_id)?;
        Ok(())
    }
}

impl FromStr for Dsn {
    type Err = ParseDsnError;

    fn from_str(s: &str) -> Result<Dsn, ParseDsnError> {
        let url = Url::parse(s).map_err(|_| ParseDsnError::InvalidUrl)?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return Err(ParseDsnError::InvalidScheme),
        };

        let host = match url.host_str() {
            Some(host) => host.to_string(),
            None => return Err(ParseDsnError::InvalidUrl),
        };
        let port = url.port();

        let project_id = match url.path().trim_matches('/').rsplit('/').next() {
            Some(segment) if !segment.is_empty() => segment.parse()?,
            _ => return Err(ParseDsnError::NoProjectId),
        };

        Ok(Dsn {
            scheme,
            host,
            port,
            project_id,
        })
    }
}

impl_str_serde!(Dsn, "a xrayradar dsn");
