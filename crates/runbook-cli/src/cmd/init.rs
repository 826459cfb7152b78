use anyhow::Context;
use runbook_core::{config::Config, io, paths};
use std::path::Path;

/// Starter playbook written by `runbook init` when none exists.
pub const STARTER_PLAYBOOK: &str = r#"placeholders:
  domain: example.com
  url: https://example.com

tasks:
  - id: recon
    name: Subdomain enumeration
    phase: Recon
    tags: [passive, dns]
    notes:
      - Only enumerate targets you are authorized to test.
    produces_files:
      - "{outdir}/hosts.txt"
    modes:
      default:
        commands:
          - cmd: "mkdir -p {outdir}"
          - cmd: "subfinder -d {domain} -silent -o {outdir}/hosts.txt"
      passive:
        commands:
          - cmd: "mkdir -p {outdir}"
          - cmd: "curl -s 'https://crt.sh/?q=%25.{domain}&output=json' | jq -r '.[].name_value' | sort -u > {outdir}/hosts.txt"

  - id: probe
    name: HTTP probing
    phase: Recon
    tags: [http]
    requires_files:
      - "{outdir}/hosts.txt"
    produces_files:
      - "{outdir}/live.txt"
    modes:
      default:
        commands:
          - cmd: "httpx -l {outdir}/hosts.txt -silent -o {outdir}/live.txt"

  - id: scan
    name: Port scan
    phase: Scan
    tags: [network]
    requires_files:
      - "{outdir}/hosts.txt"
    produces_files:
      - "{outdir}/ports.txt"
    modes:
      default:
        commands:
          - cmd: "naabu -list {outdir}/hosts.txt -top-ports 1000 -o {outdir}/ports.txt"
      full:
        commands:
          - cmd: "naabu -list {outdir}/hosts.txt -p - -o {outdir}/ports.txt"

  - id: fuzz
    name: Content discovery
    phase: Exploit
    tags: [http, noisy]
    notes:
      - Throttle requests against production hosts.
    requires_files:
      - "{outdir}/live.txt"
    produces_files:
      - "{outdir}/paths.txt"
    modes:
      default:
        commands:
          - cmd: "ffuf -u {url}/FUZZ -w wordlist.txt -o {outdir}/paths.txt -of csv"
"#;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing runbook in: {}", root.display());

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let playbook_path = config.playbook_path(root);
    let written = io::write_if_missing(&playbook_path, STARTER_PLAYBOOK.as_bytes())
        .with_context(|| format!("failed to write {}", playbook_path.display()))?;
    if written {
        println!("  created: {}", config.playbook);
    } else {
        println!("  exists:  {}", config.playbook);
    }

    println!();
    println!("Next: runbook tasks --domain <target>");
    Ok(())
}
