//! Comprehensive tests for fos-query
//!
//! End-to-end behavior of sessions, selectors, traversal, mutation and
//! the style cascade.

use fos_query::selector::{tokenize, AttributeMatcher, Combinator, Token};
use fos_query::{NodeRef, QueryError, Session};

const PAGE: &str = r#"<html><head><title>T</title></head><body>
<div id="nav" class="menu top"><a href="/a">A</a><a href="/b" class="on">B</a></div>
<ul id="list"><li>one</li><li class="x">two</li><li>three</li><li class="x">four</li><li>five</li></ul>
<form><input type="text" name="q"><input type="checkbox" name="c" checked><button type="submit">go</button></form>
</body></html>"#;

fn load() -> (Session, fos_query::DocumentId) {
    let mut session = Session::default();
    let id = session.new_document(PAGE, None).unwrap();
    (session, id)
}

fn texts(session: &mut Session, id: fos_query::DocumentId, selector: &str) -> Vec<String> {
    let selection = session.query(id, selector).unwrap();
    let tree = &selection.document().unwrap().tree;
    selection.nodes().iter().map(|&n| tree.text_content(n)).collect()
}

// ============================================================================
// TOKENIZER
// ============================================================================

#[test]
fn test_tokenize_two_alternatives() {
    let alternatives = tokenize("div.a.b, span#x > p").unwrap();
    assert_eq!(alternatives.len(), 2);
    assert_eq!(
        alternatives[0].tokens,
        vec![Token::tag("div"), Token::Classes(vec!["a".into(), "b".into()])]
    );
    assert_eq!(
        alternatives[1].tokens,
        vec![
            Token::tag("span"),
            Token::Id("x".into()),
            Token::Combinator(Combinator::Child),
            Token::tag("p"),
        ]
    );
}

#[test]
fn test_tokenize_attribute_operators() {
    let alternatives = tokenize(r#"a[href^="/"][title*=x]"#).unwrap();
    let Token::Attribute(first) = &alternatives[0].tokens[1] else {
        panic!("expected attribute token");
    };
    assert_eq!(first.name, "href");
    assert_eq!(first.matcher, Some(AttributeMatcher::Prefix("/".into())));
}

// ============================================================================
// QUERY AND FILTER
// ============================================================================

#[test]
fn test_find_deduplicates_filter_does_not() {
    let (mut session, id) = load();
    let found = session.query(id, "li.x, li:odd").unwrap();
    assert_eq!(found.len(), 2);

    let filtered = session.query(id, "li").unwrap().filter("li.x, li:odd").unwrap();
    assert_eq!(filtered.len(), 4);
}

#[test]
fn test_eq_within_and_out_of_range() {
    let (mut session, id) = load();
    assert_eq!(texts(&mut session, id, "li:eq(0)"), vec!["one"]);
    assert_eq!(texts(&mut session, id, "li:eq(4)"), vec!["five"]);
    assert!(texts(&mut session, id, "li:eq(5)").is_empty());
}

#[test]
fn test_slice_pseudo_and_method() {
    let (mut session, id) = load();
    assert_eq!(texts(&mut session, id, "li:slice(1,3)"), vec!["two", "three"]);
    assert_eq!(texts(&mut session, id, "li:slice(2)"), vec!["three", "four", "five"]);

    let sliced = session.query(id, "li").unwrap().slice(1, Some(3));
    assert_eq!(sliced.len(), 2);
}

#[test]
fn test_pseudo_classes() {
    let (mut session, id) = load();
    assert_eq!(session.query(id, ":checkbox").unwrap().len(), 1);
    assert_eq!(session.query(id, ":checked").unwrap().len(), 1);
    assert_eq!(session.query(id, ":submit").unwrap().len(), 1);
    assert_eq!(session.query(id, "form :input").unwrap().len(), 3);
    assert_eq!(texts(&mut session, id, "li:contains('THREE')"), vec!["three"]);
    assert_eq!(texts(&mut session, id, "li:not(.x)"), vec!["one", "three", "five"]);
    assert_eq!(session.query(id, "div:has(a.on)").unwrap().len(), 1);
    assert_eq!(texts(&mut session, id, "li:gt(2)"), vec!["four", "five"]);
}

#[test]
fn test_pseudo_class_table() {
    const FORM_PAGE: &str = r#"<html><body>
<h1>T</h1><h3>S</h3>
<form>
<input type="password" name="p"><input type="radio" name="r"><input type="hidden" name="h">
<input type="image" src="x.png"><input type="file" name="f"><input type="reset">
<button type="reset">clear</button><input type="text" name="t" disabled>
<select><option>a</option><option selected>b</option></select>
</form>
<div><span>only</span></div>
</body></html>"#;

    let mut session = Session::default();
    let id = session.new_document(FORM_PAGE, None).unwrap();
    let cases = [
        (":header", 2),
        (":password", 1),
        (":radio", 1),
        (":hidden", 1),
        (":image", 1),
        (":file", 1),
        (":reset", 2),
        (":disabled", 1),
        (":selected", 1),
        ("input:enabled", 6),
        ("span:only-child", 1),
        ("option:only-child", 0),
    ];
    for (selector, expected) in cases {
        assert_eq!(session.query(id, selector).unwrap().len(), expected, "{selector}");
    }
}

#[test]
fn test_is_and_attribute_selectors() {
    let (mut session, id) = load();
    let mut nav = session.query(id, "#nav").unwrap();
    assert!(nav.is(".menu").unwrap());
    assert!(!nav.is("ul, span").unwrap());
    assert_eq!(session.query(id, "a[href$='b']").unwrap().len(), 1);
    assert_eq!(session.query(id, "[class*=enu]").unwrap().len(), 1);
}

// ============================================================================
// TRAVERSAL AND HISTORY
// ============================================================================

#[test]
fn test_end_restores_immediately_preceding_stack() {
    let (mut session, id) = load();
    let list = session.query(id, "ul").unwrap();
    let list_nodes = list.nodes().to_vec();
    let items = list.children(None).unwrap();
    let item_nodes = items.nodes().to_vec();

    let last = items.filter(":last").unwrap();
    assert_eq!(last.len(), 1);

    let back = last.end();
    assert_eq!(back.nodes(), item_nodes.as_slice());
    let back = back.end();
    assert_eq!(back.nodes(), list_nodes.as_slice());
}

#[test]
fn test_traversal_chain() {
    let (mut session, id) = load();
    let selection = session
        .query(id, "li.x")
        .unwrap()
        .next(None)
        .unwrap()
        .prev_all(Some(".x"))
        .unwrap();
    assert_eq!(selection.len(), 2);
    let parent = selection.parent(None).unwrap();
    assert_eq!(parent.len(), 1);
    assert_eq!(parent.attr("id").unwrap().as_deref(), Some("list"));
}

#[test]
fn test_reacquire_state() {
    let (mut session, id) = load();
    let state = session.query(id, "a").unwrap().id();
    let again = session.selection(state).unwrap();
    assert_eq!(again.len(), 2);
}

// ============================================================================
// MUTATION
// ============================================================================

#[test]
fn test_cross_document_append_copies() {
    let (mut session, target) = load();
    let source = session
        .new_document("<section><p class='moved'>hi</p></section>", None)
        .unwrap();
    let before = session.query(source, "body").unwrap().inner_markup().unwrap();

    let moved = session.query(source, "p").unwrap().id();
    let original = session.selection(moved).unwrap().nodes()[0];
    session.query(target, "#nav").unwrap().append(moved).unwrap();

    let copied = session.query(target, "#nav p.moved").unwrap();
    assert_eq!(copied.len(), 1);
    assert_eq!(copied.text().unwrap(), "hi");

    let after = session.query(source, "body").unwrap().inner_markup().unwrap();
    assert_eq!(before, after);
    let source_p = session.query(source, "p").unwrap();
    assert_eq!(source_p.nodes(), &[original]);
}

#[test]
fn test_append_node_ref() {
    let (mut session, id) = load();
    let li = session.query(id, "li:first").unwrap().nodes()[0];
    session.query(id, "ul").unwrap().append(NodeRef::new(id, li)).unwrap();
    assert_eq!(texts(&mut session, id, "li:last"), vec!["one"]);
}

#[test]
fn test_before_after_without_parent() {
    let (mut session, id) = load();
    let before = session.document(id).unwrap().outer_markup().unwrap();
    let root = session.document(id).unwrap();
    let err = root.after("<p>x</p>").unwrap_err();
    assert!(matches!(err, QueryError::Structural(_)));
    assert_eq!(session.document(id).unwrap().outer_markup().unwrap(), before);
}

// ============================================================================
// STYLE CASCADE
// ============================================================================

#[test]
fn test_inline_style_beats_id_rule() {
    let mut session = Session::default();
    let id = session
        .new_document(
            r#"<style>#x { color: green }</style><div id="x" style="color:red">t</div>"#,
            None,
        )
        .unwrap();
    let mut div = session.query(id, "#x").unwrap();
    assert_eq!(div.css("color").unwrap().as_deref(), Some("red"));
}

#[test]
fn test_bubbling_rules() {
    let mut session = Session::default();
    let id = session
        .new_document(
            r#"<style>
                #outer { color: red }
                span { color: green }
                #inner { color: navy }
            </style>
            <div id="outer"><p>plain</p><span>weak</span><p id="inner">strong</p></div>"#,
            None,
        )
        .unwrap();

    // no own value: inherits
    assert_eq!(session.query(id, "p:first").unwrap().css("color").unwrap().as_deref(), Some("red"));
    // weaker own value: overridden
    assert_eq!(session.query(id, "span").unwrap().css("color").unwrap().as_deref(), Some("red"));
    // equal specificity own value: kept
    assert_eq!(session.query(id, "#inner").unwrap().css("color").unwrap().as_deref(), Some("navy"));
}
