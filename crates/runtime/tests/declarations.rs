mod common;

use common::{Marker, init_tracing};
use pretty_assertions::assert_eq;
use trellis_runtime::{
	AttributeKind, BuildOutcome, Declaration, DocId, ElementError, LibraryId, LibrarySpec, NodeRef, Runtime,
	RuntimeConfig, SourceLocation, TagSpec, TagType, ValidationError,
};

/// Element built from `<page>`.
#[derive(Debug)]
struct Page {
	title: String,
	cached: bool,
	sections: usize,
}

impl trellis_runtime::Element for Page {
	fn finalize(&mut self, cx: &trellis_runtime::FinalizeContext<'_>) -> Result<(), ElementError> {
		self.sections = cx.children().filter(|c| c.is::<Marker>()).count();
		if self.title.is_empty() {
			return Err(ElementError::MissingChild("title".into()));
		}
		Ok(())
	}
}

fn page_tag() -> TagSpec {
	TagSpec::new(TagType::local("page"), |decl, _| {
		let Ok(cached) = decl.bool_attribute("cached") else {
			return BuildOutcome::Inapplicable;
		};
		BuildOutcome::built(Page {
			title: decl.attribute("title").unwrap_or_default().to_owned(),
			cached: cached.unwrap_or(false),
			sections: 0,
		})
	})
	.required("title")
	.attribute("cached", false, AttributeKind::Boolean)
	.attribute("order", false, AttributeKind::Integer)
}

/// `<section extends="lib#name">` builds once the named page exists.
fn section_tag() -> TagSpec {
	TagSpec::new(TagType::local("section"), |decl, cx| {
		match decl.attribute("extends") {
			Some(name) if cx.get::<Page>(name).is_none() => BuildOutcome::NotReady,
			_ => BuildOutcome::built(Marker::new(decl.text().unwrap_or_default())),
		}
	})
	.optional("extends")
}

fn runtime(config: RuntimeConfig) -> (Runtime, LibraryId) {
	init_tracing();
	let mut runtime = Runtime::with_config(config);
	runtime.register_tag(page_tag()).unwrap();
	runtime.register_tag(section_tag()).unwrap();
	let lib = runtime
		.add_library(LibrarySpec::new("site").version("0.3.1"))
		.unwrap();
	(runtime, lib)
}

fn decl(lib: LibraryId, doc_id: u32, tag: &str) -> Declaration {
	Declaration::new(
		lib,
		DocId(doc_id),
		TagType::local(tag),
		SourceLocation::new("site.xml", doc_id + 1).with_column(4),
	)
}

#[test]
fn declarations_build_through_registered_factories() {
	let (mut runtime, lib) = runtime(RuntimeConfig::default());
	let root: NodeRef = decl(lib, 0, "page")
		.attr("title", "Home")
		.attr("cached", "yes")
		.attr("libname", "home")
		.child(decl(lib, 2, "section").with_text("intro"))
		.child(decl(lib, 1, "section").attr("extends", "site#about").with_text("body"))
		.into_ref();
	let about = decl(lib, 0, "page").attr("title", "About").attr("libname", "about").into_ref();
	runtime.add_document(lib, "home.xml", root).unwrap();
	runtime.add_document(lib, "about.xml", about).unwrap();

	let report = runtime.build_libraries();

	assert!(report.success, "{:?}", report.failed);
	assert!(report.validation.is_empty(), "{:?}", report.validation);
	assert!(runtime.library(lib).unwrap().is_built());
	let home = runtime.get_element("site#home", None).unwrap();
	let page = runtime.element(home).unwrap().downcast_ref::<Page>().unwrap();
	assert_eq!(page.title, "Home");
	assert!(page.cached);
	assert_eq!(page.sections, 2);
	assert_eq!(runtime.get_element("about", Some(lib)), runtime.get_element("#about", Some(lib)));
}

#[test]
fn validation_reports_attribute_problems() {
	let (mut runtime, lib) = runtime(RuntimeConfig::default());
	let root = decl(lib, 0, "page")
		.attr("title", "Home")
		.attr("ordr", "2")
		.child(decl(lib, 1, "page").attr("title", "Nested").attr("order", "second"))
		.child(decl(lib, 2, "section").attr("extend", "x"))
		.into_ref();
	let doc = runtime.add_document(lib, "site.xml", root).unwrap();

	let report = runtime.build(&[doc]);

	assert!(report.success);
	let errors: Vec<&ValidationError> = report.validation.iter().map(|v| &v.error).collect();
	assert_eq!(
		errors,
		[
			&ValidationError::UnknownAttribute {
				tag: TagType::local("page"),
				attribute: "ordr".into(),
				suggestion: Some("order".into()),
			},
			&ValidationError::InvalidValue {
				tag: TagType::local("page"),
				attribute: "order".into(),
				reason: "invalid integer: 'second'".into(),
			},
			&ValidationError::UnknownAttribute {
				tag: TagType::local("section"),
				attribute: "extend".into(),
				suggestion: Some("extends".into()),
			},
		]
	);
	assert_eq!(report.validation[0].line, 1);
	assert_eq!(report.validation[0].column, Some(4));
	assert_eq!(
		report.validation[0].to_string(),
		"site.xml:1: unknown attribute `ordr` on <page> (did you mean `order`?)"
	);
}

#[test]
fn missing_required_attribute_is_reported() {
	let (mut runtime, lib) = runtime(RuntimeConfig::default());
	let root = decl(lib, 0, "page").attr("title", "x").child(decl(lib, 1, "page")).into_ref();
	let doc = runtime.add_document(lib, "site.xml", root).unwrap();

	let report = runtime.build(&[doc]);

	// The nested page has no title, so its finalize fails.
	assert!(!report.success);
	assert!(report.validation.is_empty());
	assert_eq!(report.failed[0].message, "<page> in site.xml: missing child: title");

	let issues = trellis_runtime::DeclarationNode::validate(&decl(lib, 1, "page"), runtime.registry());
	assert_eq!(
		issues,
		[ValidationError::MissingAttribute {
			tag: TagType::local("page"),
			attribute: "title".into(),
		}]
	);
}

#[test]
fn validation_can_be_disabled() {
	let config = RuntimeConfig::from_toml("[build]\nvalidate = false\n").unwrap();
	let (mut runtime, lib) = runtime(config);
	let doc = runtime
		.add_document(lib, "site.xml", decl(lib, 0, "page").attr("title", "t").attr("bogus", "1").into_ref())
		.unwrap();

	let report = runtime.build(&[doc]);

	assert!(report.success);
	assert!(report.validation.is_empty());
}

#[test]
fn malformed_value_makes_declaration_inapplicable() {
	let (mut runtime, lib) = runtime(RuntimeConfig::default());
	let doc = runtime
		.add_document(
			lib,
			"site.xml",
			decl(lib, 0, "page").attr("title", "t").attr("cached", "perhaps").into_ref(),
		)
		.unwrap();

	let report = runtime.build(&[doc]);

	assert!(report.success);
	assert_eq!(report.stats.inapplicable, 1);
	assert!(runtime.elements().is_empty());
}

#[test]
fn typed_lookup_rejects_other_element_types() {
	let (mut runtime, lib) = runtime(RuntimeConfig::default());
	let root = decl(lib, 0, "page")
		.attr("title", "t")
		.child(decl(lib, 1, "section").attr("libname", "intro"))
		.child(decl(lib, 2, "section").attr("extends", "intro"))
		.into_ref();
	let doc = runtime.add_document(lib, "site.xml", root).unwrap();

	let report = runtime.build(&[doc]);

	// `intro` is a section, never a page, so the second section stays stuck.
	assert!(!report.success);
	assert_eq!(
		report.failed[0].message,
		"unable to build <section> in site.xml: a dependency was never resolved"
	);
}
