#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum Target {
    x86_64_darwin,
    x86_64_linux,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        kel::codegen::Target::from(*self).fmt(f)
    }
}

impl From<Target> for kel::codegen::Target {
    fn from(value: Target) -> Self {
        match value {
            Target::x86_64_darwin => kel::codegen::Target::x86_64_darwin,
            Target::x86_64_linux => kel::codegen::Target::x86_64_linux,
        }
    }
}

impl From<kel::codegen::Target> for Target {
    fn from(value: kel::codegen::Target) -> Self {
        match value {
            kel::codegen::Target::x86_64_darwin => Target::x86_64_darwin,
            kel::codegen::Target::x86_64_linux => Target::x86_64_linux,
        }
    }
}
