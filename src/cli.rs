use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use nutriscope::ai::{NutritionAssistant, build_context};
use nutriscope::analyser::{
    Catalog, ComparisonMetric, FilterExpression, FilterOperator, NutritionTable, Operand,
    OperatorPolicy, filter_with_policy, load_table,
};
use nutriscope::config::{self, AppSettings};
use nutriscope::error::NutriError;
use nutriscope::report;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];
const FOOD: &str = "food";
const DRINKS: &str = "drinks";

#[derive(Parser)]
#[command(
    name = "nutriscope",
    version,
    about = "Nutrition statistics, comparison and filtering for menu datasets"
)]
pub struct Cli {
    /// Path to the JSON settings file
    #[arg(long, global = true, env = "NUTRISCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Food CSV, overriding the configured path
    #[arg(long, global = true)]
    pub food: Option<PathBuf>,

    /// Drinks CSV, overriding the configured path
    #[arg(long, global = true)]
    pub drinks: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Descriptive statistics, comparison and charts for both datasets
    Stats,
    /// Compare nutrients across the datasets
    Compare {
        /// Nutrients to compare. Defaults to the columns both datasets share.
        #[arg(long, value_delimiter = ',')]
        nutrients: Option<Vec<String>>,

        /// Metrics to show (count, mean, median, std, min, max, 25%, 50%, 75%)
        #[arg(long, value_delimiter = ',')]
        metrics: Option<Vec<ComparisonMetric>>,
    },
    /// Filter rows, e.g. "Calories > 300" or "Protein between 5 10"
    Filter {
        expression: String,

        /// Category to filter. Repeatable; defaults to every category.
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },
    /// Ask the assistant a question, or start a chat session without one
    Chat { question: Option<String> },
    /// Write the effective settings (file plus overrides) to the config file
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Loaded settings and datasets shared by every command.
pub struct App {
    settings: AppSettings,
    catalog: Catalog,
    config_path: Option<PathBuf>,
}

/// Settings from the config file with command-line overrides applied.
fn effective_settings(cli: &Cli) -> AppSettings {
    let mut settings = config::load_app_config(cli.config.as_deref());
    if let Some(path) = &cli.food {
        settings.data.food_csv.clone_from(path);
    }
    if let Some(path) = &cli.drinks {
        settings.data.drinks_csv.clone_from(path);
    }
    settings
}

impl App {
    pub fn new(settings: AppSettings, catalog: Catalog) -> Self {
        Self {
            settings,
            catalog,
            config_path: None,
        }
    }

    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Read settings and load both datasets once.
    pub fn load(cli: &Cli) -> Result<Self> {
        let settings = effective_settings(cli);

        let options = settings.data.load_options();
        let food = load_table(&settings.data.food_csv, FOOD, &options)
            .with_context(|| format!("Failed to load {}", settings.data.food_csv.display()))?;
        let drinks = load_table(&settings.data.drinks_csv, DRINKS, &options)
            .with_context(|| format!("Failed to load {}", settings.data.drinks_csv.display()))?;

        let mut builder = Catalog::builder();
        builder.register(FOOD, food).register(DRINKS, drinks);
        Ok(Self::new(settings, builder.build()).with_config_path(cli.config.clone()))
    }

    fn policy(&self) -> OperatorPolicy {
        self.settings.filter.policy()
    }
}

/// Entry point after argument parsing.
pub fn run(cli: Cli) -> Result<()> {
    let mut out = std::io::stdout().lock();
    // Writing settings must not depend on the datasets loading.
    if let Some(Commands::InitConfig { force }) = cli.command {
        return write_settings(&effective_settings(&cli), cli.config.as_deref(), force, &mut out);
    }

    let app = App::load(&cli)?;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    match cli.command {
        Some(command) => run_command(&app, command, &mut input, &mut out),
        None => interactive_menu(&app, &mut input, &mut out),
    }
}

pub fn run_command(
    app: &App,
    command: Commands,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Stats => show_insights(app, out),
        Commands::Compare { nutrients, metrics } => {
            let nutrients = nutrients.map(|n| resolve_nutrients(&app.catalog, &n));
            let metrics = metrics.unwrap_or_else(|| app.settings.report.comparison_metrics.clone());
            let result = app.catalog.compare(nutrients.as_deref())?;
            write!(out, "{}", report::render_comparison(&result, &metrics))?;
            Ok(())
        }
        Commands::Filter {
            expression,
            categories,
        } => run_filter(app, &expression, &categories, out),
        Commands::Chat { question } => chat(app, question.as_deref(), input, out),
        Commands::InitConfig { force } => {
            write_settings(&app.settings, app.config_path.as_deref(), force, out)
        }
    }
}

fn write_settings(
    settings: &AppSettings,
    path: Option<&Path>,
    force: bool,
    out: &mut impl Write,
) -> Result<()> {
    let path = path.map_or_else(config::get_config_path, Path::to_path_buf);
    if path.exists() && !force {
        anyhow::bail!("{} already exists, pass --force to replace it", path.display());
    }
    config::save_app_config(settings, Some(&path))?;
    writeln!(out, "Settings written to {}", path.display())?;
    Ok(())
}

/// Match nutrient names to real columns ignoring case; unknown names are
/// kept so the comparison reports them as missing.
fn resolve_nutrients(catalog: &Catalog, names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            catalog
                .iter()
                .find_map(|table| table.resolve_column(name))
                .unwrap_or_else(|| name.trim().to_owned())
        })
        .collect()
}

fn show_insights(app: &App, out: &mut impl Write) -> Result<()> {
    let report_cfg = &app.settings.report;

    let descriptive = app.catalog.descriptive_stats()?;
    write!(out, "{}", report::render_descriptive(&descriptive))?;

    let comparison = match app.catalog.compare(None) {
        Ok(result) => Some(result),
        Err(e @ NutriError::InsufficientCategories { .. }) => {
            writeln!(out, "\n{e}")?;
            None
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(result) = &comparison {
        write!(
            out,
            "{}",
            report::render_comparison(result, &report_cfg.comparison_metrics)
        )?;
    }

    let descriptive_chart = report::render_descriptive_chart(
        &descriptive,
        &report_cfg.chart_metrics,
        report_cfg.chart_width,
    );
    write!(out, "\n{descriptive_chart}")?;
    let comparison_chart = comparison.as_ref().map(|result| {
        report::render_comparison_chart(result, &report_cfg.chart_metrics, report_cfg.chart_width)
    });
    if let Some(chart) = &comparison_chart {
        write!(out, "{chart}")?;
    }

    if let Some(dir) = &report_cfg.chart_dir {
        let path = report::save_chart(dir, report::DESCRIPTIVE_CHART_FILE, &descriptive_chart)?;
        writeln!(out, "Chart saved to {}", path.display())?;
        if let Some(chart) = &comparison_chart {
            let path = report::save_chart(dir, report::COMPARISON_CHART_FILE, chart)?;
            writeln!(out, "Chart saved to {}", path.display())?;
        }
    }
    Ok(())
}

fn run_filter(app: &App, expression: &str, categories: &[String], out: &mut impl Write) -> Result<()> {
    let tables: Vec<&NutritionTable> = if categories.is_empty() {
        app.catalog.iter().collect()
    } else {
        categories
            .iter()
            .map(|c| app.catalog.require(c.trim()))
            .collect::<Result<_, _>>()?
    };

    let expression = FilterExpression::parse(expression)?;
    for table in tables {
        let nutrient = table
            .resolve_column(&expression.nutrient)
            .unwrap_or_else(|| expression.nutrient.clone());
        let filtered = filter_with_policy(
            table,
            &nutrient,
            &expression.operator,
            expression.operand,
            app.policy(),
        )?;
        writeln!(out, "\n[{}]", table.category())?;
        write!(out, "{}", report::render_filtered(&filtered)?)?;
    }
    Ok(())
}

fn is_quit(line: &str) -> bool {
    QUIT_WORDS.contains(&line.trim().to_ascii_lowercase().as_str())
}

/// Print `message`, read one line. `None` on end of input.
fn read_line(input: &mut impl BufRead, out: &mut impl Write, message: &str) -> Result<Option<String>> {
    write!(out, "{message}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

/// Like [`read_line`], but a quit word also yields `None`.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, message: &str) -> Result<Option<String>> {
    Ok(read_line(input, out, message)?.filter(|line| !is_quit(line)))
}

enum NumberInput {
    Quit,
    Invalid,
    Value(f64),
}

fn prompt_number(input: &mut impl BufRead, out: &mut impl Write, message: &str) -> Result<NumberInput> {
    let Some(text) = prompt(input, out, message)? else {
        return Ok(NumberInput::Quit);
    };
    if let Ok(value) = text.parse::<f64>() {
        return Ok(NumberInput::Value(value));
    }
    writeln!(out, "'{text}' is not a number.\n")?;
    Ok(NumberInput::Invalid)
}

fn wait_for_quit(input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Type 'quit', 'exit' or 'q' to return to menu\n")?;
    while let Some(line) = read_line(input, out, "")? {
        if is_quit(&line) {
            writeln!(out, "Returning to menu...\n")?;
            break;
        }
    }
    Ok(())
}

fn print_menu(out: &mut impl Write) -> Result<()> {
    let rule = "=".repeat(40);
    writeln!(out, "{rule}")?;
    writeln!(out, "NUTRISCOPE")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Choose an option (1 or 2 or 3 or 4):")?;
    writeln!(out, "1. Generate nutritional insights")?;
    writeln!(out, "2. Filter dataset mode")?;
    writeln!(out, "3. Interactive Chat")?;
    writeln!(out, "4. Exit")?;
    writeln!(out, "{rule}\n")?;
    Ok(())
}

/// Menu loop. Mode errors are reported and the menu is shown again.
pub fn interactive_menu(app: &App, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    loop {
        print_menu(out)?;
        let Some(choice) = read_line(input, out, "")? else {
            return Ok(());
        };

        let outcome = match choice.as_str() {
            "1" => show_insights(app, out).and_then(|()| wait_for_quit(input, out)),
            "2" => filter_mode(app, input, out),
            "3" => chat(app, None, input, out),
            "4" => {
                writeln!(out, "\nGoodbye! Thank you for using nutriscope.")?;
                return Ok(());
            }
            other => {
                writeln!(out, "Invalid input '{other}', please type again.\n")?;
                continue;
            }
        };

        if let Err(e) = outcome {
            tracing::error!("{e:#}");
            writeln!(out, "Error: {e:#}\n")?;
        }
    }
}

fn filter_mode(app: &App, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let policy = app.policy();
    loop {
        let categories = app.catalog.categories().join("/");
        let Some(category) = prompt(
            input,
            out,
            &format!("\nChoose a category to filter ({categories}): "),
        )?
        else {
            break;
        };
        let Some(table) = app.catalog.get(&category.to_ascii_lowercase()) else {
            writeln!(out, "{}\n", NutriError::UnknownCategory(category))?;
            continue;
        };

        let columns: Vec<String> = table.columns().iter().map(|c| c.to_lowercase()).collect();
        writeln!(out, "Here are the available columns to filter: {columns:?}")?;
        let Some(wanted) = prompt(input, out, "Which nutrient/column do you want to filter by? ")?
        else {
            break;
        };
        let Some(nutrient) = table.resolve_column(&wanted) else {
            writeln!(
                out,
                "{}\n",
                NutriError::UnknownColumn {
                    category: table.category().to_owned(),
                    column: wanted,
                }
            )?;
            continue;
        };

        let Some(operator) = prompt(input, out, "Operator (>, <, ==, between): ")? else {
            break;
        };
        let parsed = operator.parse::<FilterOperator>();
        if let Err(e) = &parsed
            && policy == OperatorPolicy::Strict
        {
            writeln!(out, "{e}\n")?;
            continue;
        }

        let operand = if parsed.ok() == Some(FilterOperator::Between) {
            let low = prompt_number(input, out, "Enter min value: ")?;
            if matches!(low, NumberInput::Quit) {
                break;
            }
            let high = prompt_number(input, out, "Enter max value: ")?;
            match (low, high) {
                (_, NumberInput::Quit) => break,
                (NumberInput::Value(low), NumberInput::Value(high)) => Operand::Range(low, high),
                _ => continue,
            }
        } else {
            match prompt_number(input, out, "Enter value: ")? {
                NumberInput::Quit => break,
                NumberInput::Invalid => continue,
                NumberInput::Value(value) => Operand::Value(value),
            }
        };

        match filter_with_policy(table, &nutrient, &operator, operand, policy) {
            Ok(filtered) => write!(out, "\n{}", report::render_filtered(&filtered)?)?,
            Err(e) => {
                writeln!(out, "{e}\n")?;
                continue;
            }
        }

        writeln!(
            out,
            "\nPress Enter to continue filtering, or type 'quit', 'exit' or 'q' to return to menu\n"
        )?;
        match read_line(input, out, "")? {
            Some(line) if !is_quit(&line) => {}
            _ => break,
        }
    }
    writeln!(out, "Returning to menu...\n")?;
    Ok(())
}

fn chat(
    app: &App,
    question: Option<&str>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let api_key = config::load_api_key()?;
    let assistant = NutritionAssistant::new(&api_key, app.settings.ai.clone());
    let context = build_context(&app.catalog)?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    if let Some(question) = question {
        let answer = runtime.block_on(assistant.ask(question, &context))?;
        writeln!(out, "{answer}")?;
        return Ok(());
    }

    writeln!(out, "\n====== Interactive Chat Mode ======")?;
    writeln!(
        out,
        "Ask questions about the menu items (e.g. summarize the nutritional insights of the data)"
    )?;
    writeln!(out, "Type 'quit', 'exit' or 'q' to return to menu\n")?;

    while let Some(line) = prompt(input, out, "You: ")? {
        if line.is_empty() {
            continue;
        }
        match runtime.block_on(assistant.ask(&line, &context)) {
            Ok(answer) => writeln!(out, "\nLLM: {answer}\n")?,
            Err(e) => writeln!(out, "\n{e}\n")?,
        }
    }
    writeln!(out, "Returning to menu...\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;
    use polars::prelude::*;
    use std::io::Cursor;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    fn table(category: &str, columns: Vec<Series>) -> Result<NutritionTable> {
        let frame = DataFrame::new(columns.into_iter().map(Column::from).collect())?;
        Ok(NutritionTable::new(category, frame, Some("Item"))?)
    }

    fn app(settings: AppSettings) -> Result<App> {
        let food = table(
            FOOD,
            vec![
                Series::new("Item".into(), vec!["Scone", "Bagel", "Wrap"]),
                Series::new("Calories".into(), vec![100.0, 300.0, 500.0]),
                Series::new("Fat".into(), vec![2.0, 4.0, 6.0]),
            ],
        )?;
        let drinks = table(
            DRINKS,
            vec![
                Series::new("Item".into(), vec!["Latte", "Tea"]),
                Series::new("Calories".into(), vec![Some(190.0), None]),
            ],
        )?;
        let mut builder = Catalog::builder();
        builder.register(FOOD, food).register(DRINKS, drinks);
        Ok(App::new(settings, builder.build()))
    }

    fn run_menu(app: &App, script: &str) -> Result<String> {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        interactive_menu(app, &mut input, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_parse_compare_arguments() -> Result<()> {
        let cli = Cli::try_parse_from([
            "nutriscope",
            "compare",
            "--nutrients",
            "calories,fat",
            "--metrics",
            "mean,25%",
        ])?;
        let Some(Commands::Compare { nutrients, metrics }) = cli.command else {
            anyhow::bail!("expected compare subcommand");
        };
        assert_eq!(nutrients, Some(vec!["calories".to_owned(), "fat".to_owned()]));
        assert_eq!(metrics, Some(vec![ComparisonMetric::Mean, ComparisonMetric::Q25]));
        Ok(())
    }

    #[test]
    fn test_compare_resolves_names_ignoring_case() -> Result<()> {
        let app = app(AppSettings::default())?;
        let mut out = Vec::new();
        run_command(
            &app,
            Commands::Compare {
                nutrients: Some(vec!["calories".to_owned()]),
                metrics: Some(vec![ComparisonMetric::Max]),
            },
            &mut Cursor::new(Vec::new()),
            &mut out,
        )?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("MAX COMPARISON"), "{text}");
        assert!(text.contains("500.00"), "{text}");
        assert!(text.contains("190.00"), "{text}");
        Ok(())
    }

    #[test]
    fn test_filter_command_over_selected_category() -> Result<()> {
        let app = app(AppSettings::default())?;
        let mut out = Vec::new();
        run_filter(&app, "calories between 200 400", &[FOOD.to_owned()], &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("Bagel"), "{text}");
        assert!(!text.contains("Wrap"), "{text}");
        assert!(text.contains("Total rows after filtering: 1"), "{text}");
        Ok(())
    }

    #[test]
    fn test_filter_command_strict_rejects_operator() -> Result<()> {
        let app = app(AppSettings::default())?;
        let err = run_filter(&app, "Calories >= 100", &[], &mut Vec::new())
            .err()
            .map(|e| e.to_string());
        assert!(
            err.as_deref().is_some_and(|e| e.contains(">=")),
            "error names the operator: {err:?}"
        );
        Ok(())
    }

    #[test]
    fn test_filter_command_permissive_passes_through() -> Result<()> {
        let mut settings = AppSettings::default();
        settings.filter.permissive_operators = true;
        let app = app(settings)?;
        let mut out = Vec::new();
        run_filter(&app, "Calories >= 100", &[FOOD.to_owned()], &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("Total rows after filtering: 3"), "{text}");
        Ok(())
    }

    #[test]
    fn test_filter_command_permissive_still_checks_columns() -> Result<()> {
        let mut settings = AppSettings::default();
        settings.filter.permissive_operators = true;
        let app = app(settings)?;
        let result = run_filter(&app, "Total Fat like 3", &[FOOD.to_owned()], &mut Vec::new());
        let err = result.err().map(|e| e.to_string());
        assert!(
            err.as_deref().is_some_and(|e| e.contains("Total Fat")),
            "unknown column is reported even when the operator is waved through: {err:?}"
        );

        let err = run_filter(&app, "fat like 3", &[], &mut Vec::new())
            .err()
            .map(|e| e.to_string());
        assert!(
            err.as_deref().is_some_and(|e| e.contains("'drinks'")),
            "drinks has no Fat column: {err:?}"
        );
        Ok(())
    }

    #[test]
    fn test_parse_init_config() -> Result<()> {
        let cli = Cli::try_parse_from(["nutriscope", "--config", "settings.json", "init-config", "--force"])?;
        assert!(
            matches!(cli.command, Some(Commands::InitConfig { force: true })),
            "init-config takes --force"
        );
        assert_eq!(cli.config, Some(PathBuf::from("settings.json")), "global flag after subcommand name");
        Ok(())
    }

    #[test]
    fn test_init_config_writes_effective_settings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.json");
        let mut settings = AppSettings::default();
        settings.filter.permissive_operators = true;
        settings.data.food_csv = PathBuf::from("menus/food.csv");
        let app = app(settings.clone())?.with_config_path(Some(path.clone()));

        let mut out = Vec::new();
        run_command(&app, Commands::InitConfig { force: false }, &mut Cursor::new(Vec::new()), &mut out)?;
        assert!(String::from_utf8(out)?.contains("Settings written to"), "confirmation is printed");
        assert_eq!(config::load_app_config(Some(&path)), settings, "file holds the effective settings");

        let again = run_command(&app, Commands::InitConfig { force: false }, &mut Cursor::new(Vec::new()), &mut Vec::new());
        assert!(
            again.is_err_and(|e| e.to_string().contains("--force")),
            "an existing file is not replaced silently"
        );
        run_command(&app, Commands::InitConfig { force: true }, &mut Cursor::new(Vec::new()), &mut Vec::new())?;
        Ok(())
    }

    #[test]
    fn test_menu_exit() -> Result<()> {
        let app = app(AppSettings::default())?;
        let text = run_menu(&app, "4\n")?;
        assert!(text.contains("1. Generate nutritional insights"), "{text}");
        assert!(text.contains("Goodbye!"), "{text}");
        Ok(())
    }

    #[test]
    fn test_menu_rejects_unknown_choice() -> Result<()> {
        let app = app(AppSettings::default())?;
        let text = run_menu(&app, "7\n4\n")?;
        assert!(text.contains("Invalid input '7'"), "{text}");
        Ok(())
    }

    #[test]
    fn test_menu_insights_then_quit() -> Result<()> {
        let app = app(AppSettings::default())?;
        let text = run_menu(&app, "1\nq\n4\n")?;
        assert!(text.contains("FOOD DESCRIPTIVE STATISTICS"), "{text}");
        assert!(text.contains("MEAN COMPARISON"), "{text}");
        assert!(text.contains("MIN COMPARISON"), "{text}");
        assert!(text.contains("Returning to menu..."), "{text}");
        Ok(())
    }

    #[test]
    fn test_filter_mode_session() -> Result<()> {
        let app = app(AppSettings::default())?;
        let script = "2\nFOOD\ncalories\n>\n300\nq\n4\n";
        let text = run_menu(&app, script)?;
        assert!(text.contains("available columns to filter: [\"calories\", \"fat\"]"), "{text}");
        assert!(text.contains("Wrap"), "{text}");
        assert!(text.contains("Total rows after filtering: 1"), "{text}");
        assert!(text.contains("Goodbye!"), "{text}");
        Ok(())
    }

    #[test]
    fn test_filter_mode_reports_bad_input_and_continues() -> Result<()> {
        let app = app(AppSettings::default())?;
        let script = "2\nsnacks\nfood\nfiber\nfood\nfat\n!=\nfood\nfat\nbetween\n3\n7\nexit\n4\n";
        let text = run_menu(&app, script)?;
        assert!(text.contains("'snacks' not found in datasets"), "{text}");
        assert!(text.contains("Column 'fiber' not found in 'food' dataset"), "{text}");
        assert!(text.contains("Operator '!=' not recognized"), "{text}");
        assert!(text.contains("Bagel"), "{text}");
        assert!(text.contains("Total rows after filtering: 2"), "{text}");
        Ok(())
    }
}
