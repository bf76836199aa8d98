use sk_context::Interval;

/// A strategy registration record (§6): identity, tick throttle, and the
/// risk set it validates against. `risk_name` and `risk_list` are merged by
/// the caller (`sk-runtime`'s Registry) into a single ordered slice, `risk_name`
/// first, before being handed to `sk_risk::evaluate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySpec {
    pub name: String,
    pub interval: Interval,
    pub risk_name: Option<String>,
    pub risk_list: Vec<String>,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, interval: Interval) -> Self {
        Self {
            name: name.into(),
            interval,
            risk_name: None,
            risk_list: Vec::new(),
        }
    }

    pub fn with_risk_name(mut self, risk_name: impl Into<String>) -> Self {
        self.risk_name = Some(risk_name.into());
        self
    }

    pub fn with_risk_list(mut self, risk_list: impl IntoIterator<Item = String>) -> Self {
        self.risk_list = risk_list.into_iter().collect();
        self
    }

    /// The ordered risk names this strategy's set resolves to, `risk_name`
    /// first (§4.4).
    pub fn risk_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.risk_name.iter().map(String::as_str).collect();
        names.extend(self.risk_list.iter().map(String::as_str));
        names
    }
}
