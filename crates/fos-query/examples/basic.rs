//! Example: querying and editing a document with fos-query
//!
//! Run with `RUST_LOG=fos_query=debug` to see the query log.

use fos_query::{Config, Session};
use tracing_subscriber::EnvFilter;

const PAGE: &str = r#"<html><head><style>
    .todo { color: red }
</style></head><body>
    <h1>Tasks</h1>
    <ul id="tasks">
        <li class="todo">write parser</li>
        <li class="done">write tests</li>
        <li class="todo">ship</li>
    </ul>
</body></html>"#;

fn main() -> fos_query::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut session = Session::new(Config::default());
    let doc = session.new_document(PAGE, None)?;

    let todo = session.query(doc, "#tasks > li.todo")?;
    println!("{} open tasks:\n{}", todo.len(), todo.text()?);

    let mut first = todo.eq(0);
    println!("first task color: {:?}", first.css("color")?);

    session
        .query(doc, "#tasks")?
        .append(r#"<li class="todo">celebrate</li>"#)?
        .find("li.done")?
        .remove(None)?;

    let list = session.query(doc, "ul")?;
    println!("{list}");
    Ok(())
}
