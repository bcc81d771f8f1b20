use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context as _;
use component_engine::prelude::*;
use component_engine_devtools::Inspector;

#[derive(Debug)]
enum CounterAction {
    Increment,
    Decrement,
    Reset,
}

fn reduce(count: &i64, action: CounterAction) -> i64 {
    match action {
        CounterAction::Increment => count + 1,
        CounterAction::Decrement => count - 1,
        CounterAction::Reset => 0,
    }
}

type Outbox = Rc<RefCell<Option<Dispatch<CounterAction>>>>;

fn counter(outbox: Outbox, theme: Context<String>) -> Component {
    Component::from_fn("Counter", Properties::new().with("step_label", "Count"), move |props| {
        let (count, dispatch) = use_reducer(reduce, 0);
        let theme = use_context(&theme);
        let renders = use_ref(0u32);
        *renders.borrow_mut() += 1;

        use_effect(count, move || {
            log::info!("count changed to {count}");
            Dispose::none()
        });

        *outbox.borrow_mut() = Some(dispatch);
        let label = props.get_str("step_label").unwrap_or("Count");
        Ok(Node::element("div")
            .prop("theme", theme)
            .prop("renders", renders.current())
            .child(Node::text(format!("{label}: {count}"))))
    })
}

fn banner(theme: Context<String>) -> Component {
    Component::from_fn("Banner", Properties::new(), move |_| {
        let theme = use_context(&theme);
        Ok(Node::element("h1").child(Node::text(format!("component-engine ({theme})"))))
    })
}

fn load_config() -> anyhow::Result<EngineConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config()?;
    log::debug!("engine config: {config:?}");
    let rt = Runtime::with_config(config);
    let theme = create_context("dark".to_string());
    let outbox: Outbox = Rc::default();

    let root = rt.mount(Component::from_fn("App", Properties::new(), |_| {
        Ok(Node::element("main"))
    }))?;
    let banner_id = rt.mount_child(root, banner(theme.clone()))?;
    let counter_id = rt.mount_child(root, counter(outbox.clone(), theme.clone()))?;

    let dispatch = outbox
        .borrow()
        .clone()
        .context("counter did not publish its dispatcher")?;

    for action in [
        CounterAction::Increment,
        CounterAction::Increment,
        CounterAction::Increment,
        CounterAction::Decrement,
    ] {
        dispatch.dispatch(action);
    }
    let report = rt.flush()?;
    log::info!("flush rendered {} instances in {} passes", report.render_count(), report.passes);

    theme.set("light".to_string());
    rt.update_properties(counter_id, |p| p.set("step_label", "Total"))?;
    rt.flush()?;

    dispatch.dispatch(CounterAction::Reset);
    rt.flush()?;

    for id in [banner_id, counter_id] {
        if let Some(node) = rt.output(id)? {
            println!("{}", node.text_content());
        }
    }

    let mut inspector = Inspector::new();
    inspector.snapshot(&rt);
    println!("{}", inspector.hud_line());
    print!("{}", inspector.table());

    rt.unmount(root)?;
    Ok(())
}
