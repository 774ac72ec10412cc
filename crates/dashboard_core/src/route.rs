use std::fmt;

use crate::model::UrlId;

/// The two client-side pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    List,
    Detail(UrlId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A required path parameter was absent, e.g. `/detail/`.
    MissingParam(&'static str),
    /// A path parameter did not parse.
    InvalidParam { name: &'static str, value: String },
    NotFound(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::MissingParam(_) => write!(f, "No ID provided in the route."),
            RouteError::InvalidParam { name, value } => {
                write!(f, "Invalid {name} in the route: {value}")
            }
            RouteError::NotFound(path) => write!(f, "No page at {path}"),
        }
    }
}

impl Route {
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Route::List),
            ["detail"] => Err(RouteError::MissingParam("id")),
            ["detail", raw] => raw
                .parse::<UrlId>()
                .map(Route::Detail)
                .map_err(|_| RouteError::InvalidParam {
                    name: "id",
                    value: (*raw).to_string(),
                }),
            _ => Err(RouteError::NotFound(trimmed.to_string())),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::List => "/".to_string(),
            Route::Detail(id) => format!("/detail/{id}"),
        }
    }
}
