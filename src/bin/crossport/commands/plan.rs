//! `crossport plan` command

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::cli::PlanArgs;
use crate::commands::open_session;
use crossport::ops::Session;

pub fn execute(args: PlanArgs) -> Result<()> {
    let session = open_session(&args.session)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&session))?);
        return Ok(());
    }

    println!("target: {}", session.target);
    println!("build order:");
    for module in session.plan().iter_ordered() {
        if module.depends.is_empty() {
            println!("  {}", module.name);
        } else {
            println!("  {} <- {}", module.name, module.depends.join(", "));
        }
    }
    for name in &session.resolution.removed {
        println!("  {} (removed for {})", name, session.target.platform);
    }

    if !session.libraries.is_empty() {
        println!("external libraries:");
        for (name, version) in &session.libraries.libraries {
            if version.is_empty() {
                println!("  {}", name);
            } else {
                println!("  {} {}", name, version);
            }
        }
    }
    Ok(())
}

fn plan_json(session: &Session) -> Value {
    let target = &session.target;
    let plan = session.plan();

    let mut modules = Map::new();
    for module in plan.iter_ordered() {
        modules.insert(
            module.name.clone(),
            json!({
                "depends": module.depends,
                "original-depends": module.original_depends,
                "libs": plan.module_libs(&module.name, true, target.libc),
                "extlibs": module.extlibs,
            }),
        );
    }

    json!({
        "target": {
            "platform": target.platform,
            "compiler": target.compiler.as_str(),
            "machine": target.machine,
            "libc": target.libc.as_str(),
            "linkage": target.linkage.as_str(),
            "mode": target.mode,
            "cross": target.is_cross_building(),
        },
        "order": plan.order(),
        "modules": modules,
        "removed": session.resolution.removed,
        "extlibs": session.libraries.libraries,
    })
}
