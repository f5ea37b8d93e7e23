//! Command-line interface definitions for person search.
//!
//! API keys can come from flags or the environment (a `.env` file is loaded
//! first). Everything else about sources, pacing and endpoints lives in the
//! optional YAML config.

use clap::Parser;

/// Search papers, news and the web for one person.
///
/// # Examples
///
/// ```sh
/// # All categories, default limits
/// person_search "Jane Doe"
///
/// # Scan only Columbia's news site, include social platforms
/// person_search "Jane Doe" -u Columbia --social
///
/// # Papers only, five per source, Markdown next to the JSON
/// person_search "Jane Doe" --no-news --no-web -n 5 --markdown -o ./reports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Full name of the person to search for
    pub name: String,

    /// University hint for the news site scan (e.g. "columbia", "mit")
    #[arg(short, long)]
    pub university: Option<String>,

    /// Maximum results per source
    #[arg(short = 'n', long, default_value_t = 10)]
    pub max_results: usize,

    /// Include social platform searches in web results
    #[arg(long)]
    pub social: bool,

    /// Skip academic paper search
    #[arg(long)]
    pub no_papers: bool,

    /// Skip news search
    #[arg(long)]
    pub no_news: bool,

    /// Skip web search
    #[arg(long)]
    pub no_web: bool,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for the saved results
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// File name for the JSON results (default: derived from name and time)
    #[arg(long)]
    pub output_file: Option<String>,

    /// Items shown per source in the detailed console output
    #[arg(long, default_value_t = 5)]
    pub max_display: usize,

    /// Also write a Markdown report next to the JSON file
    #[arg(long)]
    pub markdown: bool,

    /// Tavily API key for web search
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: Option<String>,

    /// SerpAPI key for Google News search
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "person_search",
            "Jane Doe",
            "--university",
            "columbia",
            "--max-results",
            "3",
            "--social",
            "--no-web",
            "--output-dir",
            "./reports",
        ]);

        assert_eq!(cli.name, "Jane Doe");
        assert_eq!(cli.university.as_deref(), Some("columbia"));
        assert_eq!(cli.max_results, 3);
        assert!(cli.social);
        assert!(cli.no_web);
        assert!(!cli.no_papers);
        assert_eq!(cli.output_dir, "./reports");
    }

    #[test]
    fn test_cli_defaults_and_short_flags() {
        let cli = Cli::parse_from(["person_search", "Jane Doe", "-u", "mit", "-n", "7", "-o", "/tmp/out"]);

        assert_eq!(cli.university.as_deref(), Some("mit"));
        assert_eq!(cli.max_results, 7);
        assert_eq!(cli.output_dir, "/tmp/out");
        assert_eq!(cli.max_display, 5);
        assert!(!cli.markdown);
        assert!(cli.output_file.is_none());
    }

    #[test]
    fn test_cli_requires_name() {
        assert!(Cli::try_parse_from(["person_search"]).is_err());
    }
}
