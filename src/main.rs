use clap::Parser;
use fwsim::core::{Configuration, SimulatorError};
use fwsim::scenario::{load_packets, load_rules, Scenario, ScenarioRunner};
use fwsim::setup_logger::setup_logger;
use fwsim::FirewallAction;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fwsim", version, about = "ファイアウォールルールシミュレータ")]
struct Args {
    /// 実行するデモシナリオ (demo1, order_test)
    #[arg(long)]
    scenario: Option<Scenario>,

    /// ルールファイル (JSON)
    #[arg(long, value_name = "FILE", requires = "packets", conflicts_with = "scenario")]
    rules: Option<PathBuf>,

    /// パケットファイル (JSON)
    #[arg(long, value_name = "FILE", requires = "rules")]
    packets: Option<PathBuf>,

    /// どのルールにも一致しない場合のポリシー (ALLOW, DENY)
    #[arg(long = "default", value_name = "ACTION")]
    default_action: Option<FirewallAction>,

    /// 出力先 (.json ならJSON、それ以外はCSV)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn main() -> Result<(), SimulatorError> {
    let args = Args::parse();

    let config = Configuration::from_env()?;
    setup_logger(&config.logging)?;

    let (name, rules, packets, file_default) = match (&args.rules, &args.packets) {
        (Some(rules_path), Some(packets_path)) => {
            let rule_set = load_rules(rules_path)?;
            let packets = load_packets(packets_path)?;
            (rules_path.display().to_string(), rule_set.rules, packets, rule_set.default_action)
        }
        _ => {
            let scenario = match args.scenario {
                Some(scenario) => scenario,
                None => config.simulation.scenario.parse()?,
            };
            (scenario.name().to_string(), scenario.rules()?, scenario.packets(), None)
        }
    };

    let default_action = config.resolve_default_action(args.default_action, file_default);
    info!("デフォルトポリシー: {}", default_action);

    let mut runner = ScenarioRunner::new(rules, packets, default_action);
    runner.run();

    println!("Ran scenario: {}", name);
    println!("Rules:");
    for rule in runner.engine().rules() {
        println!("  {}: {} {}", rule.id(), rule.action(), rule.description().unwrap_or(""));
    }

    println!("\nResults:");
    for row in runner.results() {
        println!(
            "#{} {} => {} (rule={})",
            row.index,
            row.packet,
            row.action,
            row.matched_rule_id.as_deref().unwrap_or("None")
        );
    }

    if let Some(out) = config.resolve_report_path(args.out) {
        let format = runner.save(&out)?;
        println!("Saved {} to {}", format.name(), out.display());
    }

    Ok(())
}
