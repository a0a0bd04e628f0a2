use std::{fmt, str::FromStr};

/// Target specific module header values.
pub trait Env {
    const TRIPLE: &str;
    const DATA_LAYOUT: &str;
}

impl Env for Darwin {
    const TRIPLE: &str = "x86_64-apple-darwin";
    const DATA_LAYOUT: &str =
        "e-m:o-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128";
}

impl Env for Linux {
    const TRIPLE: &str = "x86_64-unknown-linux-gnu";
    const DATA_LAYOUT: &str =
        "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128";
}

pub struct Darwin;

pub struct Linux;

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    x86_64_darwin,
    x86_64_linux,
}

impl Target {
    pub const ALL: &[Target] = &[Target::x86_64_darwin, Target::x86_64_linux];

    pub const fn triple(&self) -> &'static str {
        match self {
            Target::x86_64_darwin => Darwin::TRIPLE,
            Target::x86_64_linux => Linux::TRIPLE,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        DEFAULT_TARGET
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::x86_64_darwin => f.write_str("x86_64_darwin"),
            Target::x86_64_linux => f.write_str("x86_64_linux"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown target '{0}'")]
pub struct UnknownTarget(pub String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .iter()
            .copied()
            .find(|t| t.to_string() == s || t.triple() == s)
            .ok_or_else(|| UnknownTarget(s.to_owned()))
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "macos")] {
        pub const DEFAULT_TARGET: Target = Target::x86_64_darwin;
    } else {
        pub const DEFAULT_TARGET: Target = Target::x86_64_linux;
    }
}
