use colored::{ColoredString, Colorize};
use tracing::debug;

use arbor_diff::{ChangeRecord, FilterOptions, StatusFlags, StatusInput};
use arbor_merge::{MergeChangeRecord, MergeChanges, MergeStatus};
use arbor_sdk::{Arbor, Manifest};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let manifest = Manifest::load(&cli.manifest)?;
    let arbor = manifest.build()?;
    debug!(
        manifest = %cli.manifest.display(),
        changesets = arbor.dag().len(),
        "repository loaded"
    );
    match cli.command {
        Command::Status(args) => cmd_status(&arbor, &manifest, args, cli.format),
        Command::Mstatus(args) => cmd_mstatus(&arbor, &manifest, args, cli.format),
        Command::Show(_) => cmd_show(&arbor, cli.format),
    }
}

fn cmd_status(
    arbor: &Arbor,
    manifest: &Manifest,
    args: StatusArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let from = arbor.resolve(&args.from)?;
    let to = arbor.resolve(&args.to)?;
    let mut opts = manifest.diff.clone();
    if args.unsorted {
        opts.sort = false;
    }

    let records = if args.filters.is_empty() {
        arbor.status(&from, &to, &opts)?
    } else {
        let inputs = args
            .filters
            .iter()
            .map(|s| s.parse::<StatusInput>())
            .collect::<Result<Vec<_>, _>>()?;
        let filter = FilterOptions {
            inputs,
            depth: args.depth,
        };
        arbor.status_filtered(&from, &to, &filter, &opts)?
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            println!(
                "Status {} {} {}",
                from.short_hex().yellow(),
                "->".dimmed(),
                to.short_hex().yellow()
            );
            if records.is_empty() {
                println!("\nNo changes.");
            }
            for record in &records {
                println!("{}", render_change(record));
            }
        }
    }
    Ok(())
}

fn cmd_mstatus(
    arbor: &Arbor,
    manifest: &Manifest,
    args: MstatusArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let merge = arbor.resolve(&args.merge)?;
    let mut opts = manifest.mstatus.clone();
    if args.no_fallback {
        opts.allow_fallback = false;
    }
    if args.unsorted {
        opts.sort = false;
    }
    let status = arbor.mstatus(&merge, &opts)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => print_merge_status(arbor, &status),
    }
    Ok(())
}

fn print_merge_status(arbor: &Arbor, status: &MergeStatus) {
    println!("{}", "Legend:".bold());
    for (label, id) in status.legend.iter() {
        let name = arbor.name_of(id).unwrap_or("");
        println!("  {}  {} {}", label.to_string().bold(), id.short_hex().yellow(), name);
    }
    println!();
    match &status.changes {
        MergeChanges::Fallback(records) => {
            println!("Single parent; changes against it:");
            for record in records {
                println!("{}", render_change(record));
            }
        }
        MergeChanges::Diamond(records) => {
            for record in records {
                println!("{}", render_merge_change(record));
            }
        }
    }
    if status.changes.is_empty() {
        println!("No changes.");
    }
}

fn cmd_show(arbor: &Arbor, format: OutputFormat) -> anyhow::Result<()> {
    let changesets = arbor.changesets()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&changesets)?),
        OutputFormat::Text => {
            for cs in &changesets {
                let parents: Vec<String> = cs.parents.iter().map(|p| p.short_hex()).collect();
                println!(
                    "{}  {:<12} gen {}  parents [{}]  {}",
                    cs.id.short_hex().yellow().bold(),
                    cs.name.as_deref().unwrap_or("-").green(),
                    cs.generation,
                    parents.join(", ").dimmed(),
                    cs.message
                );
            }
        }
    }
    Ok(())
}

fn paint_code(flags: StatusFlags) -> ColoredString {
    let code = format!("{:<4}", flags.short_code());
    if flags.contains(StatusFlags::ADDED) {
        code.green()
    } else if flags.contains(StatusFlags::DELETED) {
        code.red()
    } else {
        code.yellow()
    }
}

fn kind_marker(flags: StatusFlags) -> &'static str {
    if flags.contains(StatusFlags::DIRECTORY) {
        "/"
    } else if flags.contains(StatusFlags::SYMLINK) {
        "@"
    } else {
        ""
    }
}

/// One line per record, plus the old path when it moved or was renamed.
fn render_change(record: &ChangeRecord) -> String {
    let mut line = format!(
        "  {} {}{}",
        paint_code(record.flags),
        record.path,
        kind_marker(record.flags)
    );
    if let [orig, dest] = record.sides.as_slice() {
        if record.flags.intersects(StatusFlags::RENAMED | StatusFlags::MOVED) {
            line.push_str(&format!("  (was {})", orig.path).dimmed().to_string());
        }
        if let Some(target) = &dest.symlink_target {
            line.push_str(&format!("  -> {target}"));
        }
    }
    line
}

fn render_merge_change(record: &MergeChangeRecord) -> String {
    let mut out = format!(
        "  {} {} {}{}",
        record.existence.to_string().cyan(),
        paint_code(record.flags),
        record.path,
        kind_marker(record.flags)
    );
    for heading in &record.headings {
        out.push_str(&format!("\n        {}", heading.dimmed()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_sdk::{CommitRequest, DiffOptions, MstatusOptions, SnapshotBuilder};

    fn plain() {
        colored::control::set_override(false);
    }

    fn pair() -> (Arbor, Vec<ChangeRecord>) {
        let mut arbor = Arbor::init();
        let a = arbor
            .commit(CommitRequest::new(
                SnapshotBuilder::new("root")
                    .dir("d", "root", "dir")
                    .file("f", "d", "foo.txt", "x"),
            ))
            .unwrap();
        let b = arbor
            .commit(
                CommitRequest::new(
                    SnapshotBuilder::new("root")
                        .dir("d", "root", "dir")
                        .file("f", "d", "bar.txt", "x")
                        .symlink("s", "d", "link", "bar.txt"),
                )
                .with_parent(a),
            )
            .unwrap();
        let records = arbor.status(&a, &b, &DiffOptions::default()).unwrap();
        (arbor, records)
    }

    #[test]
    fn renders_rename_with_old_path() {
        plain();
        let (_, records) = pair();
        let lines: Vec<String> = records.iter().map(render_change).collect();
        assert_eq!(
            lines,
            [
                "  R    @1/dir/bar.txt  (was @0/dir/foo.txt)",
                "  A    @1/dir/link@",
            ]
        );
    }

    #[test]
    fn renders_merge_headings_indented() {
        plain();
        let mut arbor = Arbor::init();
        let tree = |extra: bool| {
            let t = SnapshotBuilder::new("root").dir("d", "root", "dir");
            if extra {
                t.file("n", "d", "new.txt", "n")
            } else {
                t
            }
        };
        let a = arbor.commit(CommitRequest::new(tree(false))).unwrap();
        let b = arbor
            .commit(CommitRequest::new(tree(true)).with_parent(a).with_name("b"))
            .unwrap();
        let c = arbor
            .commit(CommitRequest::new(tree(false)).with_parent(a).with_name("c"))
            .unwrap();
        let m = arbor
            .commit(CommitRequest::new(tree(true)).with_parent(b).with_parent(c))
            .unwrap();
        let status = arbor.mstatus(&m, &MstatusOptions::default()).unwrap();
        let MergeChanges::Diamond(records) = &status.changes else {
            panic!("expected a diamond");
        };
        assert_eq!(
            render_merge_change(&records[0]),
            "  _B_M A    @M/dir/new.txt\n        Added (B)"
        );
    }
}
