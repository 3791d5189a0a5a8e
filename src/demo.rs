// src/demo.rs

//! The getting-dressed demo graph.
//!
//! ```text
//! underpants -> trousers -> shoes -> end
//! socks ------------------> shoes
//! shirt -> coat -> end
//! watch -> coat
//! ```

use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::{EngineOptions, Workflow};
use crate::errors::Result;
use crate::task::{Task, TaskError, TaskFuture};

/// Items in the demo graph, in declaration order.
pub const ITEMS: [&str; 7] = [
    "underpants",
    "socks",
    "shirt",
    "watch",
    "trousers",
    "shoes",
    "coat",
];

/// Shared context of the demo: what has been put on so far.
#[derive(Debug, Default)]
pub struct Wardrobe {
    worn: Mutex<Vec<String>>,
}

impl Wardrobe {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_on(&self, item: &str) {
        self.worn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(item.to_string());
    }

    /// Items worn, in the order they were put on.
    pub fn worn(&self) -> Vec<String> {
        self.worn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Knobs for the demo run.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    pub engine: EngineOptions,
    pub task_delay: Duration,
    pub cancel_after: Option<String>,
    pub fail: Option<String>,
}

struct DressTask {
    item: &'static str,
    delay: Duration,
    fail: bool,
    cancel_after: Option<CancellationToken>,
}

impl Task<Wardrobe> for DressTask {
    fn run<'a>(&'a self, ctx: &'a Wardrobe) -> TaskFuture<'a> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if self.fail {
                return Err(TaskError::from(anyhow!("could not put on the {}", self.item)));
            }

            println!("putting on the {}", self.item);
            ctx.put_on(self.item);

            if let Some(token) = &self.cancel_after {
                info!(item = self.item, "cancelling the rest of the run");
                token.cancel();
            }
            Ok(())
        })
    }
}

/// Build the demo workflow. `cancel` must be the token later passed to
/// [`Workflow::start`] for `cancel_after` to have an effect.
pub fn build_dressing_workflow(
    options: &DemoOptions,
    cancel: &CancellationToken,
) -> Result<Workflow<Wardrobe>> {
    for name in options.cancel_after.iter().chain(options.fail.iter()) {
        if !ITEMS.contains(&name.as_str()) {
            return Err(crate::errors::WorkflowError::ConfigError(format!(
                "unknown demo task '{name}' (expected one of {ITEMS:?})"
            )));
        }
    }

    let mut wf = Workflow::with_options(options.engine);

    let add = |wf: &mut Workflow<Wardrobe>, item: &'static str| {
        let task = DressTask {
            item,
            delay: options.task_delay,
            fail: options.fail.as_deref() == Some(item),
            cancel_after: (options.cancel_after.as_deref() == Some(item)).then(|| cancel.clone()),
        };
        wf.add_node(item, task)
    };

    let underpants = add(&mut wf, "underpants")?;
    let socks = add(&mut wf, "socks")?;
    let shirt = add(&mut wf, "shirt")?;
    let watch = add(&mut wf, "watch")?;
    let trousers = add(&mut wf, "trousers")?;
    let shoes = add(&mut wf, "shoes")?;
    let coat = add(&mut wf, "coat")?;

    wf.add_start_node(underpants)?;
    wf.add_start_node(socks)?;
    wf.add_start_node(shirt)?;
    wf.add_start_node(watch)?;

    wf.add_edge(underpants, trousers)?;
    wf.add_edge(trousers, shoes)?;
    wf.add_edge(socks, shoes)?;
    wf.add_edge(shirt, coat)?;
    wf.add_edge(watch, coat)?;

    wf.connect_to_end(shoes)?;
    wf.connect_to_end(coat)?;

    Ok(wf)
}

/// Render the graph as one line per node: `name -> child, child`.
pub fn describe<C>(wf: &Workflow<C>) -> Vec<String> {
    let graph = wf.graph();
    graph
        .nodes()
        .map(|(_, node)| {
            let children: Vec<&str> = node
                .children()
                .iter()
                .filter_map(|e| graph.node(e.to).map(|n| n.name()))
                .collect();
            if children.is_empty() {
                node.name().to_string()
            } else {
                format!("{} -> {}", node.name(), children.join(", "))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunOutcome;

    fn position(worn: &[String], item: &str) -> usize {
        worn.iter()
            .position(|w| w == item)
            .unwrap_or_else(|| panic!("{item} was not worn: {worn:?}"))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn dresses_in_dependency_order() {
        let cancel = CancellationToken::new();
        let mut wf = build_dressing_workflow(&DemoOptions::default(), &cancel).unwrap();

        wf.start(cancel, Wardrobe::new()).unwrap();
        let outcome = wf.wait_for_completion().await.unwrap();
        assert_eq!(outcome, RunOutcome::Succeeded);

        let worn = wf.context().unwrap().worn();
        assert_eq!(worn.len(), ITEMS.len());
        assert!(position(&worn, "underpants") < position(&worn, "trousers"));
        assert!(position(&worn, "trousers") < position(&worn, "shoes"));
        assert!(position(&worn, "socks") < position(&worn, "shoes"));
        assert!(position(&worn, "shirt") < position(&worn, "coat"));
        assert!(position(&worn, "watch") < position(&worn, "coat"));
    }

    #[tokio::test]
    async fn failing_item_fails_the_run() {
        let options = DemoOptions {
            fail: Some("socks".to_string()),
            ..DemoOptions::default()
        };
        let cancel = CancellationToken::new();
        let mut wf = build_dressing_workflow(&options, &cancel).unwrap();

        wf.start(cancel.clone(), Wardrobe::new()).unwrap();
        let outcome = wf.wait_for_completion().await.unwrap();

        match outcome {
            RunOutcome::Failed { node, error } => {
                assert_eq!(node, "socks");
                assert!(error.contains("socks"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn unknown_demo_task_is_rejected() {
        let options = DemoOptions {
            cancel_after: Some("hat".to_string()),
            ..DemoOptions::default()
        };
        assert!(build_dressing_workflow(&options, &CancellationToken::new()).is_err());
    }

    #[test]
    fn describe_lists_every_node() {
        let wf = build_dressing_workflow(&DemoOptions::default(), &CancellationToken::new()).unwrap();
        let lines = describe(&wf);

        assert_eq!(lines.len(), ITEMS.len() + 2);
        assert_eq!(lines[0], "start -> underpants, socks, shirt, watch");
        assert_eq!(lines[1], "end");
        assert!(lines.contains(&"socks -> shoes".to_string()));
    }
}
