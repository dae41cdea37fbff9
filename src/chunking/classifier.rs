use crate::models::PriorityTier;

// Hand-written logic.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "pyw", "js", "mjs", "cjs", "jsx", "ts", "tsx", "go", "java", "kt", "kts",
    "scala", "c", "h", "cpp", "cc", "cxx", "hpp", "hxx", "cs", "fs", "vb", "swift", "m", "mm",
    "rb", "php", "ex", "exs", "hs", "lua", "dart", "vue", "svelte", "sql", "sh", "ps1",
    "razor", "cshtml", "xaml",
];

const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml", "xml", "ini", "config"];

const SETTINGS_MARKERS: &[&str] = &[
    "appsettings",
    "settings",
    "launchsettings",
    "web.config",
    "app.config",
    ".env",
];

const BUILD_EXTENSIONS: &[&str] = &[
    "csproj", "fsproj", "vbproj", "sln", "props", "targets", "gradle", "cmake", "mk",
    "lock", "pom", "nuspec",
];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst", "adoc"];

const GENERATED_MARKERS: &[&str] = &[
    "generated",
    ".designer.",
    ".g.",
    "/bin/",
    "/obj/",
    "/dist/",
    "/build/",
    "/out/",
    "/target/",
    "/node_modules/",
    ".min.",
];

/// Assigns a priority tier to a file path from its extension and name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityClassifier;

impl PriorityClassifier {
    pub fn new() -> Self {
        Self
    }

    /// First matching rule wins: source, settings config, build descriptor,
    /// docs, generated output, then the medium default.
    pub fn classify(&self, path: &str) -> PriorityTier {
        let lower = path.replace('\\', "/").to_lowercase();
        // Leading slash so directory markers also match at the repository root.
        let rooted = format!("/{}", lower);
        let ext = extension(&lower);

        if SOURCE_EXTENSIONS.contains(&ext) {
            return PriorityTier::High;
        }
        if CONFIG_EXTENSIONS.contains(&ext) && SETTINGS_MARKERS.iter().any(|m| lower.contains(m)) {
            return PriorityTier::High;
        }
        if BUILD_EXTENSIONS.contains(&ext) {
            return PriorityTier::Medium;
        }
        if DOC_EXTENSIONS.contains(&ext) {
            return PriorityTier::Low;
        }
        if GENERATED_MARKERS.iter().any(|m| rooted.contains(m)) {
            return PriorityTier::Low;
        }

        PriorityTier::Medium
    }
}

fn extension(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}
