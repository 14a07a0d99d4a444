use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A rendering or storage failure.
///
/// Errors form a chain: the most recent detail is printed first, followed by
/// the (indented) errors that caused it, each with its context lines.
#[derive(Debug)]
pub struct Error {
    detail: Box<dyn ErrorDetail>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    pub fn message(&self) -> String {
        self.detail.to_string()
    }

    pub fn context(&self) -> Vec<(Option<String>, String)> {
        self.detail.context()
    }

    /// Iterates over this error and every error behind it, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Error> + '_ {
        std::iter::successors(Some(self), |e| e.prev.as_deref())
    }

    /// Places `self` behind `other`: `other` becomes the outermost error.
    pub fn chain(self, mut other: Error) -> Self {
        fn _chain(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => _chain(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        _chain(self, &mut other);
        other
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($($T:ty),* $(,)?) => {
        $(
            impl ErrorDetail for $T {
                fn context(&self) -> Vec<(Option<String>, String)> {
                    let mut ctxt = vec![];
                    let mut error = self.source();
                    while let Some(e) = error {
                        ctxt.push((None, e.to_string()));
                        error = e.source();
                    }

                    ctxt
                }
            }
        )*
    }
}

impl_error_detail_with_std_error!(io::Error, toml::de::Error, serde_json::Error, serde_yaml::Error);

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            detail: Box::new(detail),
            prev: None,
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, error) in self.iter().enumerate() {
            let indent = " ".repeat(depth * 4);
            writeln!(f, "{indent}{}", error.detail)?;
            for (key, value) in error.detail.context() {
                match key {
                    Some(key) => writeln!(f, "{indent}    {key}: {value}")?,
                    None => writeln!(f, "{indent}    {value}")?,
                }
            }

            if std::env::var_os("RUST_BACKTRACE").is_some() {
                writeln!(f, "{indent}    [{}]", error.location)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct MakeshiftError {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl fmt::Display for MakeshiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for MakeshiftError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::MakeshiftError {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(other.into()))
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| e.into().chain(f().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_errors_print_newest_first() {
        let inner: Result<()> = err!("file vanished", "path" => "content/blog/a.md");
        let outer = inner.chain(error!("failed to read post", "slug" => "a")).unwrap_err();

        let messages: Vec<_> = outer.iter().map(|e| e.message()).collect();
        assert_eq!(messages, ["failed to read post", "file vanished"]);

        let display = outer.to_string();
        let outer_at = display.find("failed to read post").unwrap();
        let inner_at = display.find("file vanished").unwrap();
        assert!(outer_at < inner_at);
        assert!(display.contains("slug: a"));
        assert!(display.contains("path: content/blog/a.md"));
    }

    #[test]
    fn io_errors_convert() {
        fn open() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here/folio")?)
        }

        let error = open().unwrap_err();
        assert!(!error.message().is_empty());
    }
}
