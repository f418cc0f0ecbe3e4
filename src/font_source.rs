use std::{future::Future, path::PathBuf, pin::Pin};

use crate::error::FetchError;

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send>>;

/// Asynchronous source of font bytes.
///
/// The worker calls `fetch` once per URL it does not know yet and awaits
/// every pending fetch before it starts compiling a frame.
pub trait FontSource: Send + Sync {
    fn fetch(&self, url: &str) -> FetchFuture;
}

/// Reads fonts from `file:` URLs, plain paths and `data:` URLs.
///
/// Relative paths are resolved against `base_dir` when one is set.
#[derive(Clone, Debug, Default)]
pub struct LocalFontSource {
    pub base_dir: Option<PathBuf>,
}

impl LocalFontSource {
    /// Source resolving relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source resolving relative paths against `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn locate(&self, url: &str) -> Result<Location, FetchError> {
        match url::Url::parse(url) {
            Ok(parsed) => match parsed.scheme() {
                "data" => Ok(Location::Data),
                "file" => parsed
                    .to_file_path()
                    .map(Location::Path)
                    .map_err(|_| FetchError::InvalidUrl {
                        url: url.to_string(),
                        reason: "not a local file path".to_string(),
                    }),
                // a single letter scheme is a windows drive, not a url
                scheme if scheme.len() == 1 => Ok(Location::Path(PathBuf::from(url))),
                scheme => Err(FetchError::UnsupportedScheme(scheme.to_string())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = PathBuf::from(url);
                Ok(Location::Path(match &self.base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path,
                }))
            }
            Err(e) => Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

enum Location {
    Data,
    Path(PathBuf),
}

impl FontSource for LocalFontSource {
    fn fetch(&self, url: &str) -> FetchFuture {
        let url = url.to_string();
        let location = self.locate(&url);
        Box::pin(async move {
            match location? {
                Location::Data => decode_data_url(&url),
                Location::Path(path) => std::fs::read(&path).map_err(|source| FetchError::Io {
                    url: url.clone(),
                    source,
                }),
            }
        })
    }
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.chars().take(64).collect(),
        reason,
    };
    let data_url = data_url::DataUrl::process(url).map_err(|e| invalid(format!("{e:?}")))?;
    let (body, _fragment) = data_url
        .decode_to_vec()
        .map_err(|e| invalid(format!("{e:?}")))?;
    Ok(body)
}
