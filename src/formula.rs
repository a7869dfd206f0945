//! Homebrew formula generation.
//!
//! The formula carries the same four-way table as [`ReleaseTable`], expressed
//! with Homebrew's `OS.mac?` / `Hardware::CPU.arm?` checks. Its URLs use
//! Homebrew's `#{version}` interpolation so the version appears only once.

use std::fmt::Write;

use crate::completion::Shell;
use crate::install::BINARY_NAME;
use crate::platform::{Arch, Os, Platform};
use crate::release::ReleaseTable;

/// Render the formula for `table`.
///
/// Unpublished checksums are emitted as-is, so rendering the built-in table
/// yields the template the release workflow fills in.
pub fn render(table: &ReleaseTable) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "class Aphelion < Formula");
    let _ = writeln!(out, "  desc {}", quote(&table.description));
    let _ = writeln!(out, "  homepage {}", quote(&table.homepage));
    let _ = writeln!(out, "  version {}", quote(&table.version));
    let _ = writeln!(out);

    for (i, os) in [Os::Darwin, Os::Linux].into_iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "elsif" };
        let check = match os {
            Os::Darwin => "OS.mac?",
            Os::Linux => "OS.linux?",
        };
        let _ = writeln!(out, "  {} {}", keyword, check);
        let _ = writeln!(out, "    if Hardware::CPU.arm?");
        write_source(&mut out, table, Platform::new(os, Arch::Arm64));
        let _ = writeln!(out, "    else");
        write_source(&mut out, table, Platform::new(os, Arch::Amd64));
        let _ = writeln!(out, "    end");
    }
    let _ = writeln!(out, "  end");
    let _ = writeln!(out);

    let _ = writeln!(out, "  def install");
    let _ = writeln!(out, "    bin.install Dir[\"*\"].first => \"{}\"", BINARY_NAME);
    for shell in Shell::ALL {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "    output = Utils.safe_popen_read(bin/\"{}\", \"completion\", \"{}\")",
            BINARY_NAME, shell
        );
        let _ = writeln!(
            out,
            "    ({}/\"{}\").write output",
            completion_dir_method(shell),
            shell.file_name(BINARY_NAME)
        );
    }
    let _ = writeln!(out, "  end");
    let _ = writeln!(out);

    let _ = writeln!(out, "  test do");
    let _ = writeln!(out, "    system \"#{{bin}}/{}\", \"version\"", BINARY_NAME);
    let _ = writeln!(
        out,
        "    assert_match version.to_s, shell_output(\"#{{bin}}/{} version\")",
        BINARY_NAME
    );
    let _ = writeln!(out, "  end");
    let _ = writeln!(out, "end");

    out
}

fn write_source(out: &mut String, table: &ReleaseTable, platform: Platform) {
    // Only the `#{version}` interpolation is left live in the URL literal
    let base = table.download_base.trim_end_matches('/');
    let _ = writeln!(
        out,
        "      url \"{}/v#{{version}}/{}\"",
        escape(base),
        escape(&platform.asset_name())
    );
    let _ = writeln!(out, "      sha256 {}", quote(table.checksum(platform).as_str()));
}

fn completion_dir_method(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash => "bash_completion",
        Shell::Zsh => "zsh_completion",
        Shell::Fish => "fish_completion",
    }
}

/// Ruby double-quoted string literal.
fn quote(s: &str) -> String {
    format!("\"{}\"", escape(s))
}

/// Body of a Ruby double-quoted string, with interpolation disabled.
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '#' => escaped.push_str("\\#"),
            _ => escaped.push(c),
        }
    }
    escaped
}
