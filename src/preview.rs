use crate::deployer::{AssetPlan, DeployPlan, Operation};
use colored::Colorize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Represents a node in the tree (either file or directory).
#[derive(Debug)]
struct TreeNode {
    name: String,
    children: Vec<Rc<RefCell<TreeNode>>>,
    is_file: bool,
}
impl TreeNode {
    fn new(name: String, is_file: bool) -> Self {
        Self {
            name,
            children: Vec::new(),
            is_file,
        }
    }
}

/// Destination paths a plan touches, in plan order, marker last.
fn planned_paths(plan: &DeployPlan) -> Vec<(PathBuf, bool)> {
    let mut paths = Vec::new();

    for asset in &plan.assets {
        let AssetPlan::Copy { operations, .. } = asset else {
            continue;
        };

        for operation in operations {
            match operation {
                Operation::CreateDir { path } => paths.push((path.clone(), false)),
                Operation::CopyFile { destination, .. } => {
                    paths.push((destination.clone(), true))
                }
            }
        }
    }

    paths.push((plan.marker.clone(), true));

    paths
}

/// Build the destination tree from the plan, returning the root node.
fn build_tree(plan: &DeployPlan) -> Rc<RefCell<TreeNode>> {
    let destination = plan.dest_root.as_path();

    let root_name = destination
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string());

    let root = Rc::new(RefCell::new(TreeNode::new(root_name, false)));

    // map full path to node
    let mut lookup: HashMap<PathBuf, Rc<RefCell<TreeNode>>> = HashMap::new();
    lookup.insert(destination.to_path_buf(), Rc::clone(&root));

    for (path, is_file) in planned_paths(plan) {
        // overwrites and already created ancestors show up once
        if lookup.contains_key(&path) {
            continue;
        }

        let Ok(relative) = path.strip_prefix(destination) else {
            log::debug!("planned path outside destination: {}", path.display());
            continue;
        };

        // intermediate directories of nested destinations get their own nodes
        let mut parent_path = destination.to_path_buf();
        let mut parent_node = Rc::clone(&root);
        let mut components = relative.components().peekable();

        while let Some(component) = components.next() {
            let current = parent_path.join(component);
            let is_leaf = components.peek().is_none();

            let node = match lookup.get(&current).cloned() {
                Some(node) => node,
                None => {
                    let name = component.as_os_str().to_string_lossy().to_string();
                    let node = Rc::new(RefCell::new(TreeNode::new(name, is_leaf && is_file)));

                    parent_node.borrow_mut().children.push(Rc::clone(&node));
                    lookup.insert(current.clone(), Rc::clone(&node));

                    node
                }
            };

            parent_path = current;
            parent_node = node;
        }
    }

    root
}

/// Renders the tree with ASCII connectors into `lines`.
fn render_tree(
    node: &Rc<RefCell<TreeNode>>,
    prefix: &str,
    is_last: bool,
    lines: &mut Vec<String>,
) {
    let node_borrow = node.borrow();

    let connector = if is_last {
        "└── ".yellow()
    } else {
        "├── ".yellow()
    };
    let name = if node_borrow.is_file {
        node_borrow.name.green()
    } else {
        node_borrow.name.blue()
    };
    lines.push(format!("{}{}{}", prefix.yellow(), connector, name));

    let child_prefix = if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let len = node_borrow.children.len();
    for (i, child) in node_borrow.children.iter().enumerate() {
        render_tree(child, &child_prefix, i == len - 1, lines);
    }
}

/// Returns the preview of `plan` as printable lines.
pub fn render_plan(plan: &DeployPlan) -> Vec<String> {
    let mut lines = Vec::new();

    render_tree(&build_tree(plan), "", true, &mut lines);

    for asset in &plan.assets {
        if let AssetPlan::Skip { label, source } = asset {
            lines.push(format!(
                "{} {} ({} not found)",
                "skip".dimmed(),
                label,
                source.display()
            ));
        }
    }

    lines
}

pub fn preview_as_tree(plan: &DeployPlan, destination: &Path) {
    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    let fancy_prompt = format!(
        "{} {} {}\n",
        "┌─".bold().bright_blue(),
        "Preview".bold().bright_blue(),
        destination.display()
    );

    println!("{}", fancy_prompt);

    for line in render_plan(plan) {
        println!("{}", line);
    }

    let fancy_prompt = format!(
        "\n{} {}\n",
        "└─".bold().bright_blue(),
        "Dry run: nothing was built or written".bright_green()
    );

    println!("{}", fancy_prompt);
}
