//! The `xmp` template tag.
//!
//! A host template engine registers the tag with [`register`], builds an
//! [`XmpTag`] per occurrence in a template, and calls [`XmpTag::render`] with
//! its own [`RenderContext`]:
//!
//! ```text
//! {% xmp file_path="photos/cat.jpg" property_namespace="dc" property_name="rights" %}
//! ```
//!
//! Nothing is cached. Each render reads and scans the file again.

use std::{path::PathBuf, sync::Arc};

use crate::{
    container,
    error::TagError,
    markup::{self, AttributeList, MarkupError},
    xmp::Xmp,
};

/// The name templates use to call this tag.
pub const TAG_NAME: &str = "xmp";

/// What the host template engine provides at render time.
pub trait RenderContext {
    /// Looks up a variable in the current template scope.
    fn resolve_variable(&self, name: &str) -> Option<String>;

    /// Resolves a `file_path` parameter against the site's source directory.
    ///
    /// By default, the path is used as-is.
    fn in_source_dir(&self, path: &str) -> PathBuf {
        PathBuf::from(path)
    }
}

/// Builds a tag from its markup.
pub type TagFactory = fn(&str) -> Result<XmpTag, TagError>;

/// Somewhere tags can be registered, like a template engine's tag table.
pub trait TagRegistry {
    /// Makes `factory` callable from templates as `name`.
    fn register_tag(&mut self, name: &'static str, factory: TagFactory);
}

/// Registers the `xmp` tag with the host.
///
/// Hosts call this during their own setup; nothing is registered otherwise.
pub fn register(registry: &mut impl TagRegistry) {
    log::debug!("Registering the `{TAG_NAME}` tag.");
    registry.register_tag(TAG_NAME, XmpTag::new);
}

/// One occurrence of the `xmp` tag in a template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XmpTag {
    markup: String,
}

impl XmpTag {
    /// Creates a tag from its raw markup.
    ///
    /// Only the syntax is checked here. Parameters can't be resolved until
    /// there's a context to render in.
    pub fn new(markup: &str) -> Result<Self, TagError> {
        if !markup::validate_syntax(markup) {
            log::error!("Rejecting `{TAG_NAME}` tag with invalid markup: `{markup}`");
            return Err(MarkupError::Syntax {
                markup: markup.to_string(),
                example: markup::syntax_example(),
            }
            .into());
        }

        Ok(Self {
            markup: markup.to_string(),
        })
    }

    /// The markup this tag was created from.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Resolves this tag's parameters in `context`.
    pub fn parameters(&self, context: &impl RenderContext) -> Result<AttributeList, TagError> {
        markup::parse(&self.markup, |name| context.resolve_variable(name)).map_err(TagError::from)
    }

    /// Renders the tag to the property's value.
    ///
    /// Returns an empty string when the file has no readable XMP, or when the
    /// XMP doesn't have the property.
    ///
    /// # Errors
    ///
    /// - [`TagError::Markup`] if a required parameter is missing.
    /// - [`TagError::FileAccess`] if `file_path` isn't a readable, regular
    ///   file.
    pub fn render(&self, context: &impl RenderContext) -> Result<String, TagError> {
        let parameters: AttributeList = self.parameters(context)?;

        // `markup::parse` already made sure these are all present
        let file_path: &str = parameters.get("file_path").unwrap_or_default();
        let namespace: &str = parameters.get("property_namespace").unwrap_or_default();
        let name: &str = parameters.get("property_name").unwrap_or_default();

        let path: PathBuf = context.in_source_dir(file_path);
        if !path.is_file() {
            log::error!("`{}` isn't a regular file.", path.display());
            return Err(TagError::FileAccess { path, source: None });
        }

        let packet = match container::extract_packet_from_path(&path) {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                log::debug!("`{}` has no XMP packet. Rendering nothing.", path.display());
                return Ok(String::new());
            }
            Err(e) => {
                return Err(TagError::FileAccess {
                    path,
                    source: Some(Arc::new(e)),
                });
            }
        };

        let Ok(xmp) = Xmp::from_packet(&packet)
            .inspect_err(|e| log::warn!("`{}` has unreadable XMP. err: {e}", path.display()))
        else {
            return Ok(String::new());
        };

        Ok(xmp.property(namespace, name).unwrap_or_else(|| {
            log::debug!("`{}` has no `{namespace}` property `{name}`.", path.display());
            String::new()
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        path::{Path, PathBuf},
    };

    use crate::{
        container::{XMP_KEYWORD, itxt, make_jpeg_sample, make_png_sample, xmp_app1},
        error::TagError,
        markup::MarkupError,
        tag::{RenderContext, TAG_NAME, TagFactory, TagRegistry, XmpTag, register},
        util::logger,
    };

    const PACKET: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:xmp="http://ns.adobe.com/xap/1.0/"
        xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmp:CreateDate="2023-08-14T18:30:00">
      <dc:rights>
        <rdf:Alt><rdf:li xml:lang="x-default">(c) Jane Doe</rdf:li></rdf:Alt>
      </dc:rights>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>"#;

    /// A fake site: a source directory and some template variables.
    struct Site {
        source_dir: PathBuf,
        variables: HashMap<&'static str, &'static str>,
    }

    impl Site {
        /// Makes a fresh, empty source directory for one test.
        fn new(test_name: &str) -> Self {
            let source_dir = std::env::temp_dir().join(format!(
                "xmp_tag_{test_name}_{}",
                std::process::id()
            ));
            _ = std::fs::remove_dir_all(&source_dir);
            std::fs::create_dir_all(&source_dir).unwrap();

            Self {
                source_dir,
                variables: HashMap::new(),
            }
        }

        fn with_variable(mut self, name: &'static str, value: &'static str) -> Self {
            self.variables.insert(name, value);
            self
        }

        fn write(&self, file_name: &str, bytes: &[u8]) -> &Self {
            std::fs::write(self.source_dir.join(file_name), bytes).unwrap();
            self
        }
    }

    impl Drop for Site {
        fn drop(&mut self) {
            _ = std::fs::remove_dir_all(&self.source_dir);
        }
    }

    impl RenderContext for Site {
        fn resolve_variable(&self, name: &str) -> Option<String> {
            self.variables.get(name).map(|v| v.to_string())
        }

        fn in_source_dir(&self, path: &str) -> PathBuf {
            self.source_dir.join(path)
        }
    }

    fn jpeg() -> Vec<u8> {
        make_jpeg_sample(&[
            (0xE0, b"JFIF\0\x01\x02\0\0\x01\0\x01\0\0".as_slice()),
            (0xE1, xmp_app1(PACKET.as_bytes()).as_slice()),
        ])
    }

    fn png() -> Vec<u8> {
        make_png_sample(&[
            (b"iTXt", itxt(XMP_KEYWORD, true, PACKET.as_bytes()).as_slice()),
            (b"IEND", b"".as_slice()),
        ])
    }

    fn render(site: &Site, markup: &str) -> Result<String, TagError> {
        XmpTag::new(markup)?.render(site)
    }

    #[test]
    fn renders_from_jpeg() {
        logger();

        let site = Site::new("renders_from_jpeg");
        site.write("cat.jpg", &jpeg());

        assert_eq!(
            render(
                &site,
                r#"file_path="cat.jpg" property_namespace="xmp" property_name="CreateDate""#
            )
            .unwrap(),
            "2023-08-14T18:30:00"
        );
    }

    #[test]
    fn renders_from_png_with_variables() {
        logger();

        let site = Site::new("renders_from_png_with_variables")
            .with_variable("page.image", "cat.png")
            .with_variable("dc_uri", "http://purl.org/dc/elements/1.1/");
        site.write("cat.png", &png());

        assert_eq!(
            render(
                &site,
                "file_path=page.image property_namespace=dc_uri property_name='rights'"
            )
            .unwrap(),
            "(c) Jane Doe"
        );
    }

    #[test]
    fn absent_metadata_renders_empty() {
        logger();

        let site = Site::new("absent_metadata_renders_empty");
        site.write("cat.jpg", &jpeg())
            .write("plain.jpg", &make_jpeg_sample(&[(0xE0, b"JFIF\0".as_slice())]))
            .write("notes.txt", b"not an image")
            .write("garbage.jpg", &[0xFF, 0xD8, 0xFF, 0xE1, 0xFF, 0xFF, 0x00])
            .write("latin1.jpg", &make_jpeg_sample(&[(0xE1, xmp_app1(b"\xE9t\xE9").as_slice())]));

        for (file, property) in [
            ("cat.jpg", "Rating"),
            ("plain.jpg", "CreateDate"),
            ("notes.txt", "CreateDate"),
            ("garbage.jpg", "CreateDate"),
            ("latin1.jpg", "CreateDate"),
        ] {
            let markup =
                format!("file_path='{file}' property_namespace='xmp' property_name='{property}'");
            assert_eq!(render(&site, &markup).unwrap(), "", "{file}: {property}");
        }
    }

    #[test]
    fn bad_syntax_fails_at_construction() {
        logger();

        for markup in [
            r#"file_path="cat.jpg"#,
            "file_path",
            "file_path=='x'",
            "file_path='a'property_name='b'",
            "key=!",
        ] {
            let Err(TagError::Markup(MarkupError::Syntax { markup: got, example })) =
                XmpTag::new(markup)
            else {
                panic!("`{markup}` should be a syntax error");
            };

            assert_eq!(got, markup);
            assert_eq!(example, format!("{{% {TAG_NAME} file='value' key=variable %}}"));
        }
    }

    #[test]
    fn missing_parameters_fail_at_render() {
        logger();

        let site = Site::new("missing_parameters_fail_at_render");
        site.write("cat.jpg", &jpeg());

        // syntax is fine, so construction works
        let tag = XmpTag::new("file_path='cat.jpg' property_namespace='xmp'").unwrap();

        let Err(TagError::Markup(MarkupError::MissingParameters {
            parameters,
            required,
        })) = tag.render(&site)
        else {
            panic!("render should fail without `property_name`");
        };

        assert_eq!(parameters.get("file_path"), Some("cat.jpg"));
        assert_eq!(parameters.len(), 2);
        assert_eq!(
            required,
            vec!["file_path", "property_namespace", "property_name"]
        );
    }

    #[test]
    fn file_must_exist_and_be_regular() {
        logger();

        let site = Site::new("file_must_exist_and_be_regular");
        std::fs::create_dir_all(site.source_dir.join("a_directory")).unwrap();

        for file_path in ["missing.jpg", "a_directory"] {
            let markup = format!(
                "file_path='{file_path}' property_namespace='xmp' property_name='CreateDate'"
            );

            match render(&site, &markup) {
                Err(TagError::FileAccess { path, source: None }) => {
                    assert_eq!(path, site.source_dir.join(file_path));
                }
                other => panic!("expected `FileAccess` for `{file_path}`, got: {other:?}"),
            }
        }
    }

    /// Unresolved variables still count as present, but resolve to an empty
    /// path, which isn't a file.
    #[test]
    fn unresolved_file_variable_is_a_file_error() {
        logger();

        let site = Site::new("unresolved_file_variable_is_a_file_error");

        let err = render(
            &site,
            "file_path=page.nothing property_namespace='xmp' property_name='CreateDate'",
        )
        .unwrap_err();

        assert!(matches!(err, TagError::FileAccess { .. }));
        assert!(err.to_string().starts_with("Could not locate file "));
    }

    #[test]
    fn every_render_rereads_the_file() {
        logger();

        let site = Site::new("every_render_rereads_the_file");
        let tag =
            XmpTag::new("file_path='cat.jpg' property_namespace='dc' property_name='rights'")
                .unwrap();

        site.write("cat.jpg", &jpeg());
        assert_eq!(tag.render(&site).unwrap(), "(c) Jane Doe");

        let edited = PACKET.replace("Jane Doe", "John Roe");
        site.write(
            "cat.jpg",
            &make_jpeg_sample(&[(0xE1, xmp_app1(edited.as_bytes()).as_slice())]),
        );
        assert_eq!(tag.render(&site).unwrap(), "(c) John Roe");
    }

    #[test]
    fn default_source_dir_is_identity() {
        struct NoSite;
        impl RenderContext for NoSite {
            fn resolve_variable(&self, _name: &str) -> Option<String> {
                None
            }
        }

        assert_eq!(NoSite.in_source_dir("a/b.jpg"), Path::new("a/b.jpg"));
    }

    #[test]
    fn registers_under_tag_name() {
        logger();

        #[derive(Default)]
        struct Registry(Vec<(&'static str, TagFactory)>);
        impl TagRegistry for Registry {
            fn register_tag(&mut self, name: &'static str, factory: TagFactory) {
                self.0.push((name, factory));
            }
        }

        let mut registry = Registry::default();
        register(&mut registry);

        assert_eq!(registry.0.len(), 1);
        let (name, factory) = registry.0[0];
        assert_eq!(name, "xmp");
        assert_eq!(
            factory("property_name='x'").unwrap().markup(),
            "property_name='x'"
        );
        assert!(factory("'x'").is_err());
    }
}
