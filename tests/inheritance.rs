//! Integration tests for block overriding along extends chains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use snippet_layout::{
    CompileError, ComponentNode, Engine, EngineConfig, MemoryLoader, RenderError, RenderRequest,
};

fn engine(templates: &[(&str, &str)]) -> Engine {
    let loader = templates
        .iter()
        .fold(MemoryLoader::new(), |loader, (name, source)| {
            loader.with_template(*name, *source)
        });
    Engine::new(loader)
}

fn render(engine: &Engine, name: &str) -> Result<String, RenderError> {
    let root = ComponentNode::root();
    engine
        .render(name, RenderRequest::new(&root))
        .map(|r| r.output)
}

#[test]
fn test_most_derived_block_wins() {
    let engine = engine(&[
        ("layout", "<title>{block title}Site{/block}</title>"),
        ("page", "{extends layout}{block title}Page{/block}"),
    ]);
    assert_eq!(render(&engine, "page").unwrap(), "<title>Page</title>");
}

#[test]
fn test_parent_chain_order() {
    let engine = engine(&[
        ("c", "<{block x}C{/block}>"),
        ("b", "{extends c}{block x}B({include #parent}){/block}"),
        ("a", "{extends b}{block x}A({include #parent}){/block}"),
    ]);
    assert_eq!(render(&engine, "a").unwrap(), "<A(B(C))>");
    assert_eq!(render(&engine, "b").unwrap(), "<B(C)>");
}

#[test]
fn test_parent_past_oldest_implementation_fails() {
    let engine = engine(&[
        ("c", "{block x}C{include #parent}{/block}"),
        ("b", "{extends c}{block x}B{include #parent}{/block}"),
        ("a", "{extends b}{block x}A{include #parent}{/block}"),
    ]);
    let err = render(&engine, "a").unwrap_err();
    assert!(matches!(err, RenderError::MissingParentBlock { name } if name == "x"));
}

#[test]
fn test_repeated_parent_calls_reach_the_same_parent() {
    let engine = engine(&[
        ("base", "{block x}base{/block}"),
        ("page", "{extends base}{block x}{include #parent}+{include #parent}{/block}"),
    ]);
    assert_eq!(render(&engine, "page").unwrap(), "base+base");
}

#[test]
fn test_missing_block() {
    let engine = engine(&[("page", "{include #nowhere}")]);
    let err = render(&engine, "page").unwrap_err();
    assert!(matches!(err, RenderError::MissingBlock { name } if name == "nowhere"));
}

#[test]
fn test_same_name_in_descendant_is_allowed() {
    let engine = engine(&[
        ("base", "{block a}1{/block}{block b}2{/block}"),
        ("page", "{extends base}{block a}x{/block}{block b}y{/block}"),
    ]);
    assert_eq!(render(&engine, "page").unwrap(), "xy");
}

#[test]
fn test_duplicate_in_one_unit_fails_to_compile() {
    let engine = engine(&[("page", "{block a}1{/block}{define a}2{/define}")]);
    let err = render(&engine, "page").unwrap_err();
    assert!(matches!(
        err,
        RenderError::Compile {
            source: CompileError::DuplicateBlock { .. },
            ..
        }
    ));
}

#[test]
fn test_extending_unit_output_is_suppressed() {
    let engine = engine(&[
        ("layout", "[{block content}{/block}]"),
        ("page", "{extends layout}ignored{block content}kept{/block}ignored"),
    ]);
    assert_eq!(render(&engine, "page").unwrap(), "[kept]");
}

#[test]
fn test_extends_auto_uses_request_layout() {
    let engine = engine(&[
        ("@layout", "<body>{block content}{/block}</body>"),
        ("page", "{extends auto}{block content}hi{/block}"),
    ]);
    let root = ComponentNode::root();
    let rendered = engine
        .render("page", RenderRequest::new(&root).with_layout("@layout"))
        .unwrap();
    assert_eq!(rendered.output, "<body>hi</body>");

    // without a layout the unit renders in place
    assert_eq!(render(&engine, "page").unwrap(), "hi");
}

#[test]
fn test_caller_supplied_ancestor() {
    let engine = engine(&[
        ("frame", "({block content}{/block})"),
        ("page", "{block content}body{/block}"),
        ("standalone", "{extends none}{block content}alone{/block}"),
    ]);
    let root = ComponentNode::root();
    let rendered = engine
        .render("page", RenderRequest::new(&root).with_extends("frame"))
        .unwrap();
    assert_eq!(rendered.output, "(body)");

    let rendered = engine
        .render("standalone", RenderRequest::new(&root).with_extends("frame"))
        .unwrap();
    assert_eq!(rendered.output, "alone");
}

#[test]
fn test_extends_variable() {
    let engine = engine(&[
        ("wide", "W{block c}{/block}"),
        ("page", "{extends $layout}{block c}!{/block}"),
    ]);
    let root = ComponentNode::root();
    let rendered = engine
        .render(
            "page",
            RenderRequest::new(&root).with_param("layout", "wide"),
        )
        .unwrap();
    assert_eq!(rendered.output, "W!");
}

#[test]
fn test_parent_resolves_through_anonymous_and_ifset() {
    let engine = engine(&[
        ("base", "[{block x}base{/block}]"),
        (
            "page",
            "{extends base}{block x}{block}{ifset $a}<{include #parent}>{/ifset}{/block}{/block}",
        ),
    ]);
    let root = ComponentNode::root();
    let rendered = engine
        .render("page", RenderRequest::new(&root).with_param("a", "1"))
        .unwrap();
    assert_eq!(rendered.output, "[<base>]");
}

#[test]
fn test_parent_outside_block_fails_to_compile() {
    let engine = engine(&[("page", "{include #parent}")]);
    let err = render(&engine, "page").unwrap_err();
    assert!(matches!(
        err,
        RenderError::Compile {
            source: CompileError::OutsideBlock { .. },
            ..
        }
    ));
}

#[test]
fn test_anonymous_block_is_transparent() {
    let engine = engine(&[("page", "a{block}b{/block}c")]);
    assert_eq!(render(&engine, "page").unwrap(), "abc");
}

#[test]
fn test_anonymous_block_modifier_applied_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let engine = engine(&[("page", "a{block|tick}b{$x}{/block}c")]).with_filter(
        "tick",
        move |s, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            format!("[{}]", s)
        },
    );
    let root = ComponentNode::root();
    let rendered = engine
        .render("page", RenderRequest::new(&root).with_param("x", "!"))
        .unwrap();
    assert_eq!(rendered.output, "a[b!]c");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_named_block_modifier() {
    let engine = engine(&[("page", "{block title|upper}hello{/block}")]);
    assert_eq!(render(&engine, "page").unwrap(), "HELLO");
}

#[test]
fn test_define_with_local_arguments() {
    let engine = engine(&[(
        "page",
        "{define row}<{$n}>{/define}{include #row, n => 1}{include #row, n => 2}",
    )]);
    assert_eq!(render(&engine, "page").unwrap(), "<1><2>");
}

#[test]
fn test_include_this_recurses_until_limit() {
    let engine = engine(&[("page", "{define r}.{include #this}{/define}{include #r}")])
        .with_config(EngineConfig::default().with_max_depth(8));
    let err = render(&engine, "page").unwrap_err();
    assert!(matches!(err, RenderError::RecursionLimit));
}

#[test]
fn test_self_extending_layout_hits_limit() {
    let engine = engine(&[("loop", "{extends loop}")]);
    let err = render(&engine, "loop").unwrap_err();
    assert!(matches!(err, RenderError::RecursionLimit));
}

#[test]
fn test_includeblock_shares_registry() {
    let engine = engine(&[
        ("lib", "{define button}[{$label}]{/define}"),
        ("page", "{includeblock lib}{include #button, label => ok}"),
    ]);
    assert_eq!(render(&engine, "page").unwrap(), "[ok]");
}

#[test]
fn test_include_template_gets_fresh_registry() {
    let engine = engine(&[
        ("part", "({block inner}part{/block})"),
        ("page", "{block inner}page{/block}{include part}"),
    ]);
    assert_eq!(render(&engine, "page").unwrap(), "page(part)");
}

#[test]
fn test_include_template_arguments() {
    let engine = engine(&[
        ("greet", "Hello {$who}"),
        ("page", "{include greet, who => $name}!"),
    ]);
    let root = ComponentNode::root();
    let rendered = engine
        .render("page", RenderRequest::new(&root).with_param("name", "you"))
        .unwrap();
    assert_eq!(rendered.output, "Hello you!");
}

#[test]
fn test_dynamic_block_name() {
    let engine = engine(&[("page", "{block \"item-$i\"}I{$i}{/block}|{include #$name}")]);
    let root = ComponentNode::root();
    let rendered = engine
        .render(
            "page",
            RenderRequest::new(&root)
                .with_param("i", "1")
                .with_param("name", "item-1"),
        )
        .unwrap();
    assert_eq!(rendered.output, "I1|I1");
}

#[test]
fn test_dynamic_name_skips_uniqueness_check() {
    let engine = engine(&[(
        "page",
        "{block content}S{/block}{block \"con$x\"}D{/block}",
    )]);
    let root = ComponentNode::root();
    let rendered = engine
        .render("page", RenderRequest::new(&root).with_param("x", "tent"))
        .unwrap();
    assert_eq!(rendered.output, "SS");
}

#[test]
fn test_ifset_block() {
    let engine = engine(&[
        ("layout", "{ifset #sidebar}<aside>{include #sidebar}</aside>{/ifset}{block main}{/block}"),
        ("with", "{extends layout}{define sidebar}S{/define}{block main}M{/block}"),
        ("without", "{extends layout}{block main}M{/block}"),
    ]);
    assert_eq!(render(&engine, "with").unwrap(), "<aside>S</aside>M");
    assert_eq!(render(&engine, "without").unwrap(), "M");
}

#[test]
fn test_unterminated_trailing_block_is_closed() {
    let engine = engine(&[("page", "a{block tail}b")]);
    assert_eq!(render(&engine, "page").unwrap(), "ab");

    let strict = self::engine(&[("page", "a{block tail}b")])
        .with_config(EngineConfig::default().with_strict_blocks(true));
    let err = render(&strict, "page").unwrap_err();
    assert!(matches!(
        err,
        RenderError::Compile {
            source: CompileError::Unterminated { .. },
            ..
        }
    ));
}
