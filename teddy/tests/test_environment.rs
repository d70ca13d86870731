use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use teddy::{context, Environment, Error, ErrorKind};

use similar_asserts::assert_eq;

#[test]
fn test_basic() {
    let mut env = Environment::new();
    env.add_template("test", "<p>{x}</p>");
    let t = env.get_template("test").unwrap();
    assert_eq!(t.name(), "test");
    assert_eq!(t.source(), "<p>{x}</p>");
    assert_eq!(t.render(context!(x => 42)).unwrap(), "<p>42</p>");
}

#[test]
fn test_template_not_found() {
    let env = Environment::new();
    let err = env.get_template("missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
    assert_eq!(
        err.to_string(),
        "template not found: template \"missing\" does not exist"
    );
}

#[test]
fn test_render_name_or_text() {
    let mut env = Environment::new();
    env.add_template("greeting", "<b>{name}</b>");
    let ctx = context!(name => "Ann");
    assert_eq!(env.render("greeting", ctx.clone()).unwrap(), "<b>Ann</b>");
    assert_eq!(env.render("no such template", ctx.clone()).unwrap(), "no such template");
    assert_eq!(env.render("<i>{name}</i>", ctx).unwrap(), "<i>Ann</i>");
}

#[test]
fn test_owned_templates() {
    let mut env = Environment::new();
    let name = String::from("dyn");
    let source = String::from("<p>{! hidden !}{v}</p>");
    env.add_template_owned(name, source);
    assert_eq!(env.get_template("dyn").unwrap().source(), "<p>{v}</p>");
    assert_eq!(env.render("dyn", context!(v => 1)).unwrap(), "<p>1</p>");

    env.remove_template("dyn");
    assert!(env.get_template("dyn").is_err());
}

#[test]
fn test_replace_template() {
    let mut env = Environment::new();
    env.add_template("t", "one");
    env.add_template_owned("t".to_string(), "two".to_string());
    assert_eq!(env.render("t", context!()).unwrap(), "two");
    env.add_template("t", "three");
    assert_eq!(env.render("t", context!()).unwrap(), "three");
}

#[test]
fn test_loader() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut env = Environment::new();
    env.set_loader({
        let calls = calls.clone();
        move |name| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok(match name {
                "item" => Some("<li>{v}</li>".into()),
                _ => None,
            })
        }
    });
    let rv = env
        .render_str(
            r#"<loop through="xs" val="x"><include src="item"><arg v>{x}</arg></include></loop>"#,
            context!(xs => vec![1, 2, 3]),
        )
        .unwrap();
    assert_eq!(rv, "<li>1</li><li>2</li><li>3</li>");
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    env.clear_templates();
    env.render_str(r#"<include src="item"/>"#, context!()).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 2);
}

#[test]
fn test_loader_errors_propagate() {
    let mut env = Environment::new();
    env.set_loader(|_| Err(Error::new(ErrorKind::InvalidOperation, "disk on fire")));
    let err = env
        .render_str(r#"<include src="x"/>"#, context!())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(err.name(), Some("x"));
    assert_eq!(err.to_string(), "invalid operation: disk on fire (in x)");
}

#[test]
fn test_template_from_str() {
    let env = Environment::new();
    let tmpl = env.template_from_named_str("inline", "<if a>{b}</if>");
    assert_eq!(tmpl.name(), "inline");
    assert_eq!(tmpl.render(context!(a => true, b => "yes")).unwrap(), "yes");
    assert_eq!(
        env.template_from_str("x").render(context!()).unwrap(),
        "x"
    );
}

#[test]
fn test_settings() {
    let mut env = Environment::new();
    assert_eq!(env.max_passes(), 1000);
    assert_eq!(env.verbosity(), 1);
    env.set_max_passes(5);
    env.set_verbosity(0);
    assert_eq!(env.max_passes(), 5);
    assert_eq!(env.verbosity(), 0);
}

#[test]
fn test_pass_budget_counts_includes() {
    let mut env = Environment::new();
    env.add_template("p", "<i>{x}</i>");
    let source = r#"<loop through="xs" val="x"><include src="p"/></loop>"#;
    let ctx = context!(xs => vec![1, 2, 3, 4]);

    env.set_max_passes(5);
    assert_eq!(env.render_str(source, ctx.clone()).unwrap_err().pass_limit(), Some(5));

    env.set_max_passes(6);
    assert_eq!(
        env.render_str(source, ctx).unwrap(),
        "<i>1</i><i>2</i><i>3</i><i>4</i>"
    );
}

#[test]
fn test_shared_across_threads() {
    let mut env = Environment::new();
    env.add_template("t", "<p>{n}</p>");
    let env = Arc::new(env);
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let env = env.clone();
            std::thread::spawn(move || env.render("t", context!(n)).unwrap())
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, ["<p>0</p>", "<p>1</p>", "<p>2</p>", "<p>3</p>"]);
}
