//! Page head metadata.
//!
//! Pages declare a [`SeoMetadata`] and [`reconcile`] brings a
//! [`HeadDocument`] in line with it: the title is set, there is exactly one
//! description meta tag and exactly one canonical link. Reconciling twice
//! with the same inputs changes nothing the second time.

use tracing::debug;

/// Name of the description meta tag.
pub const DESCRIPTION_META: &str = "description";

/// Relation of the canonical link tag.
pub const CANONICAL_REL: &str = "canonical";

/// Metadata a page wants in its head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    /// Path for the canonical link. Defaults to the document's own path.
    pub canonical_path: Option<String>,
}

impl SeoMetadata {
    /// Metadata without an explicit canonical path.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            canonical_path: None,
        }
    }

    /// Use `path` for the canonical link.
    #[must_use]
    pub fn with_canonical_path(mut self, path: impl Into<String>) -> Self {
        self.canonical_path = Some(path.into());
        self
    }
}

/// A `<meta name=".." content="..">` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// A `<link rel=".." href="..">` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTag {
    pub rel: String,
    pub href: String,
}

/// A change made by [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadPatch {
    SetTitle(String),
    InsertMeta(MetaTag),
    UpdateMeta(MetaTag),
    RemoveMeta(MetaTag),
    InsertLink(LinkTag),
    UpdateLink(LinkTag),
    RemoveLink(LinkTag),
}

/// The head of one rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadDocument {
    title: String,
    metas: Vec<MetaTag>,
    links: Vec<LinkTag>,
    path: String,
    origin: String,
}

impl HeadDocument {
    /// Empty head for the page at `path` on the site at `origin`
    /// (scheme, host and port, no trailing slash).
    #[must_use]
    pub fn new(origin: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            metas: Vec::new(),
            links: Vec::new(),
            path: path.into(),
            origin: origin.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Set the layout's default title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_meta(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.metas.push(MetaTag {
            name: name.into(),
            content: content.into(),
        });
        self
    }

    #[must_use]
    pub fn with_link(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push(LinkTag {
            rel: rel.into(),
            href: href.into(),
        });
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn metas(&self) -> &[MetaTag] {
        &self.metas
    }

    #[must_use]
    pub fn links(&self) -> &[LinkTag] {
        &self.links
    }

    /// Path of the page this head belongs to.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Move to another page on the same site.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Absolute URL for `path`, or for the document's own path.
    #[must_use]
    pub fn canonical_url(&self, path: Option<&str>) -> String {
        let path = path.unwrap_or(&self.path);
        if path.starts_with('/') {
            format!("{}{path}", self.origin)
        } else {
            format!("{}/{path}", self.origin)
        }
    }
}

/// Bring `doc` in line with `metadata`, returning the changes made.
///
/// An empty result means the document already matched.
pub fn reconcile(doc: &mut HeadDocument, metadata: &SeoMetadata) -> Vec<HeadPatch> {
    let mut patches = Vec::new();

    if doc.title != metadata.title {
        doc.title.clone_from(&metadata.title);
        patches.push(HeadPatch::SetTitle(metadata.title.clone()));
    }

    reconcile_description(doc, &metadata.description, &mut patches);

    let href = doc.canonical_url(metadata.canonical_path.as_deref());
    reconcile_canonical(doc, &href, &mut patches);

    if !patches.is_empty() {
        debug!(path = %doc.path, patches = patches.len(), "Head reconciled");
    }
    patches
}

fn reconcile_description(doc: &mut HeadDocument, content: &str, patches: &mut Vec<HeadPatch>) {
    let mut seen = false;
    let mut removed = Vec::new();

    doc.metas.retain_mut(|meta| {
        if !meta.name.eq_ignore_ascii_case(DESCRIPTION_META) {
            return true;
        }
        if seen {
            removed.push(meta.clone());
            return false;
        }
        seen = true;
        if meta.content != content {
            content.clone_into(&mut meta.content);
            patches.push(HeadPatch::UpdateMeta(meta.clone()));
        }
        true
    });

    patches.extend(removed.into_iter().map(HeadPatch::RemoveMeta));

    if !seen {
        let meta = MetaTag {
            name: DESCRIPTION_META.to_owned(),
            content: content.to_owned(),
        };
        doc.metas.push(meta.clone());
        patches.push(HeadPatch::InsertMeta(meta));
    }
}

fn reconcile_canonical(doc: &mut HeadDocument, href: &str, patches: &mut Vec<HeadPatch>) {
    let mut seen = false;
    let mut removed = Vec::new();

    doc.links.retain_mut(|link| {
        if !link.rel.eq_ignore_ascii_case(CANONICAL_REL) {
            return true;
        }
        if seen {
            removed.push(link.clone());
            return false;
        }
        seen = true;
        if link.href != href {
            href.clone_into(&mut link.href);
            patches.push(HeadPatch::UpdateLink(link.clone()));
        }
        true
    });

    patches.extend(removed.into_iter().map(HeadPatch::RemoveLink));

    if !seen {
        let link = LinkTag {
            rel: CANONICAL_REL.to_owned(),
            href: href.to_owned(),
        };
        doc.links.push(link.clone());
        patches.push(HeadPatch::InsertLink(link));
    }
}

/// Keeps one head in sync with the metadata of the page it shows.
///
/// Remembers the last metadata and path applied and skips reconciling when
/// neither changed.
#[derive(Debug, Clone)]
pub struct SeoInjector {
    document: HeadDocument,
    applied: Option<(SeoMetadata, String)>,
}

impl SeoInjector {
    #[must_use]
    pub const fn new(document: HeadDocument) -> Self {
        Self {
            document,
            applied: None,
        }
    }

    /// Apply `metadata`, returning the changes made to the head.
    pub fn apply(&mut self, metadata: &SeoMetadata) -> Vec<HeadPatch> {
        if let Some((last, path)) = &self.applied
            && last == metadata
            && *path == self.document.path
        {
            return Vec::new();
        }

        let patches = reconcile(&mut self.document, metadata);
        self.applied = Some((metadata.clone(), self.document.path.clone()));
        patches
    }

    /// Move to another page. The next [`SeoInjector::apply`] reconciles
    /// even if the metadata is unchanged.
    pub fn navigate(&mut self, path: impl Into<String>) {
        self.document.set_path(path);
    }

    #[must_use]
    pub const fn document(&self) -> &HeadDocument {
        &self.document
    }

    #[must_use]
    pub fn into_document(self) -> HeadDocument {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> HeadDocument {
        HeadDocument::new("https://pos.example.com", "/products")
    }

    fn count_descriptions(doc: &HeadDocument) -> usize {
        doc.metas()
            .iter()
            .filter(|m| m.name == DESCRIPTION_META)
            .count()
    }

    fn count_canonicals(doc: &HeadDocument) -> usize {
        doc.links().iter().filter(|l| l.rel == CANONICAL_REL).count()
    }

    #[test]
    fn test_reconcile_inserts_missing_tags() {
        let mut head = doc();
        let patches = reconcile(&mut head, &SeoMetadata::new("Products", "All products"));

        assert_eq!(patches.len(), 3);
        assert_eq!(head.title(), "Products");
        assert_eq!(head.metas()[0].content, "All products");
        assert_eq!(head.links()[0].href, "https://pos.example.com/products");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut head = doc();
        let meta = SeoMetadata::new("Products", "All products");
        reconcile(&mut head, &meta);
        let snapshot = head.clone();

        assert!(reconcile(&mut head, &meta).is_empty());
        assert_eq!(head, snapshot);
    }

    #[test]
    fn test_reconcile_updates_existing_tags_in_place() {
        let mut head = doc()
            .with_title("POS")
            .with_meta("viewport", "width=device-width")
            .with_meta("description", "Layout default")
            .with_link("stylesheet", "/static/app.css")
            .with_link("canonical", "https://pos.example.com/");

        let patches = reconcile(&mut head, &SeoMetadata::new("Products", "All products"));

        assert!(patches.contains(&HeadPatch::UpdateMeta(MetaTag {
            name: "description".to_owned(),
            content: "All products".to_owned(),
        })));
        assert_eq!(head.metas().len(), 2);
        assert_eq!(head.metas()[0].name, "viewport");
        assert_eq!(head.links()[1].href, "https://pos.example.com/products");
    }

    #[test]
    fn test_reconcile_removes_duplicates() {
        let mut head = doc()
            .with_meta("description", "one")
            .with_meta("Description", "two")
            .with_link("canonical", "https://a.example/")
            .with_link("canonical", "https://b.example/");

        let patches = reconcile(&mut head, &SeoMetadata::new("T", "one"));

        assert_eq!(count_descriptions(&head), 1);
        assert_eq!(head.metas().len(), 1);
        assert_eq!(count_canonicals(&head), 1);
        assert!(
            patches
                .iter()
                .any(|p| matches!(p, HeadPatch::RemoveMeta(m) if m.content == "two"))
        );
        assert!(
            patches
                .iter()
                .any(|p| matches!(p, HeadPatch::RemoveLink(l) if l.href == "https://b.example/"))
        );
    }

    #[test]
    fn test_canonical_path_overrides_location() {
        let mut head = doc();
        reconcile(
            &mut head,
            &SeoMetadata::new("Products", "d").with_canonical_path("/catalog"),
        );
        assert_eq!(head.links()[0].href, "https://pos.example.com/catalog");
    }

    #[test]
    fn test_origin_trailing_slash_trimmed() {
        let head = HeadDocument::new("http://localhost:3000/", "/");
        assert_eq!(head.canonical_url(None), "http://localhost:3000/");
        assert_eq!(head.canonical_url(Some("settings")), "http://localhost:3000/settings");
    }

    #[test]
    fn test_injector_skips_unchanged_inputs() {
        let mut injector = SeoInjector::new(doc());
        let meta = SeoMetadata::new("Products", "All products");

        assert!(!injector.apply(&meta).is_empty());
        assert!(injector.apply(&meta).is_empty());

        injector.navigate("/subscription");
        let patches = injector.apply(&meta);
        assert_eq!(
            patches,
            vec![HeadPatch::UpdateLink(LinkTag {
                rel: CANONICAL_REL.to_owned(),
                href: "https://pos.example.com/subscription".to_owned(),
            })]
        );
        assert_eq!(count_canonicals(injector.document()), 1);
    }
}
