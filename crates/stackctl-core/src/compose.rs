//! Docker Compose file reading and command construction.
//!
//! Only the parts of the Compose format the launcher needs are read: the
//! service names and each service's published ports. Everything else in the
//! file is ignored.

use std::collections::BTreeMap;
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::exec::{Invocation, StreamMode};

/// Errors from reading a Compose file.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// The file does not exist.
    #[error("Docker Compose file not found: {0}")]
    NotFound(Utf8PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read Docker Compose file {path}: {source}")]
    Read {
        /// The Compose file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid YAML or does not have the Compose shape.
    #[error("failed to parse Docker Compose file {path}: {message}")]
    Parse {
        /// The Compose file.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The file parsed but defines no services.
    #[error("no services defined in Docker Compose file {0}")]
    NoServices(Utf8PathBuf),
}

/// Result alias for Compose file operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// One entry of a service's `ports` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    /// Bare container port (`- 80`).
    Number(u32),
    /// Short syntax (`- "8080:80"`, `- "127.0.0.1:5432:5432/tcp"`).
    Short(String),
    /// Long syntax map.
    Long {
        /// Container port.
        target: u32,
        /// Host port or range.
        #[serde(default)]
        published: Option<PortValue>,
        /// `tcp` or `udp`.
        #[serde(default)]
        protocol: Option<String>,
        /// Host interface to bind.
        #[serde(default)]
        host_ip: Option<String>,
    },
}

/// A port that may be written as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    /// `8080`
    Number(u32),
    /// `"8080"` or `"8080-8081"`
    Text(String),
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Short(s) => f.write_str(s),
            Self::Long {
                target,
                published,
                protocol,
                host_ip,
            } => {
                if let Some(ip) = host_ip {
                    write!(f, "{ip}:")?;
                }
                if let Some(published) = published {
                    write!(f, "{published}:")?;
                }
                write!(f, "{target}")?;
                if let Some(protocol) = protocol {
                    write!(f, "/{protocol}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServiceDefinition {
    #[serde(default)]
    ports: Vec<PortSpec>,
}

#[derive(Debug, Deserialize)]
struct ComposeDocument {
    #[serde(default)]
    services: Option<BTreeMap<String, Option<ServiceDefinition>>>,
}

/// Port mappings of one service, as shown after it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePorts {
    /// Service name.
    pub service: String,
    /// Port mappings as written in the Compose file.
    pub ports: Vec<String>,
}

/// The services of a Compose file.
#[derive(Debug, Clone)]
pub struct ComposeFile {
    path: Utf8PathBuf,
    services: BTreeMap<String, Vec<PortSpec>>,
}

impl ComposeFile {
    /// Read and parse a Compose file.
    #[instrument(fields(path = %path))]
    pub fn load(path: &Utf8Path) -> ComposeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ComposeError::NotFound(path.to_path_buf())
            } else {
                ComposeError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(path, &text)
    }

    /// Parse Compose YAML that was read from `path`.
    pub fn parse(path: &Utf8Path, text: &str) -> ComposeResult<Self> {
        let document: ComposeDocument =
            serde_saphyr::from_str(text).map_err(|e| ComposeError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let services: BTreeMap<String, Vec<PortSpec>> = document
            .services
            .unwrap_or_default()
            .into_iter()
            .map(|(name, definition)| (name, definition.unwrap_or_default().ports))
            .collect();
        if services.is_empty() {
            return Err(ComposeError::NoServices(path.to_path_buf()));
        }

        debug!(count = services.len(), "services found");
        Ok(Self {
            path: path.to_path_buf(),
            services,
        })
    }

    /// The file this was read from.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Port mappings of a service (empty if it has none or is unknown).
    pub fn ports(&self, service: &str) -> ServicePorts {
        ServicePorts {
            service: service.to_string(),
            ports: self
                .services
                .get(service)
                .map(|ports| ports.iter().map(ToString::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// `docker compose -f <file> pull <service>`
    pub fn pull(&self, service: &str) -> Invocation {
        self.compose(["pull", service])
    }

    /// `docker compose -f <file> up -d <service>`
    pub fn up(&self, service: &str) -> Invocation {
        self.compose(["up", "-d", service])
    }

    fn compose<'s>(&self, args: impl IntoIterator<Item = &'s str>) -> Invocation {
        let mut all = vec!["compose".to_string(), "-f".to_string(), self.path.to_string()];
        all.extend(args.into_iter().map(str::to_string));
        Invocation::new("docker", all).streams(StreamMode::Ignore, StreamMode::Inherit)
    }
}
