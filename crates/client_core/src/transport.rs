//! Backend resource addressing.

use url::Url;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn parse(server_url: &str) -> Result<Self> {
        let mut base = Url::parse(server_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Settings(format!(
                "server url '{server_url}' cannot carry a path"
            )));
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn catalog(&self) -> Url {
        self.at(&["static", "items.json"])
    }

    pub fn metadata(&self, name: &str) -> Url {
        self.at(&["static", "images", name, "meta.json"])
    }

    pub fn preview(&self, name: &str) -> Url {
        self.at(&["static", "images", name, "preview.png"])
    }

    pub fn submit(&self) -> Url {
        self.at(&["submit"])
    }

    pub fn button(&self) -> Url {
        self.at(&["button"])
    }

    // Each segment is percent-encoded, so an item name never escapes its slot.
    fn at(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
