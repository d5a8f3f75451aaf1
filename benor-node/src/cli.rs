//! cli.rs

use clap::Parser;

use benor_common::config::BASE_NODE_PORT;
use benor_common::{BenorError, SimConfig, Value};

#[derive(Parser)]
#[command(name = "benor-node")]
#[command(about = "Randomized binary consensus simulator")]
pub struct Cli {
    /// Total number of nodes (N)
    #[arg(short = 'n', long, default_value_t = 3)]
    pub nodes: usize,

    /// Number of faulty nodes (F)
    #[arg(short = 'f', long, default_value_t = 0)]
    pub faulty: usize,

    /// Initial values, one per node: 0, 1 or ? (defaults to alternating 0/1)
    #[arg(long, value_delimiter = ',')]
    pub values: Vec<String>,

    /// Indices of the faulty nodes
    #[arg(long, value_delimiter = ',')]
    pub faulty_nodes: Vec<usize>,

    /// First port of the cluster; node i listens on base-port + i
    #[arg(long, default_value_t = BASE_NODE_PORT)]
    pub base_port: u16,

    /// Seed for the tie-break coin (omit for entropy)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    pub fn to_config(&self) -> Result<SimConfig, BenorError> {
        let initial_values: Vec<Value> = if self.values.is_empty() {
            (0..self.nodes)
                .map(|i| if i % 2 == 0 { Value::Zero } else { Value::One })
                .collect()
        } else {
            self.values
                .iter()
                .map(|s| s.parse::<Value>().map_err(BenorError::Config))
                .collect::<Result<_, _>>()?
        };

        let mut faulty = vec![false; self.nodes];
        for &index in &self.faulty_nodes {
            if index >= self.nodes {
                return Err(BenorError::Config(format!(
                    "faulty node index {index} out of range (n={})",
                    self.nodes
                )));
            }
            faulty[index] = true;
        }

        let config = SimConfig::new(self.nodes, self.faulty, initial_values, faulty)
            .with_base_port(self.base_port);
        let config = match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_and_faulty_list() {
        let cli = Cli::parse_from([
            "benor-node",
            "-n",
            "4",
            "-f",
            "1",
            "--values",
            "0,0,1,?",
            "--faulty-nodes",
            "3",
        ]);
        let config = cli.to_config().unwrap();
        assert_eq!(config.n, 4);
        assert_eq!(config.f, 1);
        assert_eq!(config.initial_values[3], Value::Undecided);
        assert_eq!(config.faulty, vec![false, false, false, true]);
    }

    #[test]
    fn test_defaults_fill_alternating_values() {
        let cli = Cli::parse_from(["benor-node", "-n", "3"]);
        let config = cli.to_config().unwrap();
        assert_eq!(
            config.initial_values,
            vec![Value::Zero, Value::One, Value::Zero]
        );
    }

    #[test]
    fn test_out_of_range_faulty_index_is_fatal() {
        let cli = Cli::parse_from(["benor-node", "-n", "2", "-f", "1", "--faulty-nodes", "5"]);
        assert!(matches!(cli.to_config(), Err(BenorError::Config(_))));
    }

    #[test]
    fn test_faulty_count_mismatch_is_fatal() {
        let cli = Cli::parse_from(["benor-node", "-n", "3", "-f", "2", "--faulty-nodes", "1"]);
        assert!(matches!(cli.to_config(), Err(BenorError::Config(_))));
    }
}
