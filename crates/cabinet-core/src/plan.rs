//! The subscription plan catalogue.
//!
//! Plans are product configuration rather than per-user data, so they live in
//! code instead of the store.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanFeature {
  pub id:       &'static str,
  pub name:     &'static str,
  pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
  pub id:          &'static str,
  pub name:        &'static str,
  /// Roubles per `period`.
  pub price:       u32,
  pub period:      &'static str,
  pub description: &'static str,
  pub features:    Vec<PlanFeature>,
  pub popular:     bool,
}

const fn feature(
  id: &'static str,
  name: &'static str,
  included: bool,
) -> PlanFeature {
  PlanFeature { id, name, included }
}

/// All plans, cheapest first.
pub fn catalogue() -> Vec<Plan> {
  vec![
    Plan {
      id:          "starter",
      name:        "Стартовый",
      price:       15_000,
      period:      "месяц",
      description: "Для начинающих предпринимателей",
      popular:     false,
      features:    vec![
        feature("contracts", "До 3 договоров в месяц", true),
        feature("consultations", "2 консультации", true),
        feature("documents", "Шаблоны документов", true),
        feature("support", "Email поддержка", true),
        feature("court", "Судебное представительство", false),
        feature("priority", "Приоритетная обработка", false),
      ],
    },
    Plan {
      id:          "optimum",
      name:        "Бизнес Оптимум",
      price:       45_000,
      period:      "месяц",
      description: "Для малого и среднего бизнеса",
      popular:     true,
      features:    vec![
        feature("contracts", "До 10 договоров в месяц", true),
        feature("consultations", "5 консультаций", true),
        feature("documents", "Все шаблоны документов", true),
        feature("support", "Приоритетная поддержка", true),
        feature("court", "Судебное представительство", true),
        feature("priority", "Приоритетная обработка", false),
      ],
    },
    Plan {
      id:          "enterprise",
      name:        "Корпоративный",
      price:       120_000,
      period:      "месяц",
      description: "Для крупного бизнеса",
      popular:     false,
      features:    vec![
        feature("contracts", "Безлимитные договоры", true),
        feature("consultations", "Безлимитные консультации", true),
        feature("documents", "Все шаблоны + кастомные", true),
        feature("support", "Выделенный менеджер", true),
        feature("court", "Полное сопровождение в суде", true),
        feature("priority", "Приоритетная обработка 24/7", true),
      ],
    },
  ]
}

pub fn find(id: &str) -> Option<Plan> {
  catalogue().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalogue_order_and_shape() {
    let plans = catalogue();
    let ids: Vec<_> = plans.iter().map(|p| p.id).collect();
    assert_eq!(ids, ["starter", "optimum", "enterprise"]);
    for plan in &plans {
      assert!(plan.price > 0, "{} has no price", plan.id);
      assert!(!plan.features.is_empty(), "{} has no features", plan.id);
    }
    assert_eq!(plans.iter().filter(|p| p.popular).count(), 1);
  }

  #[test]
  fn prices_increase_with_tier() {
    let prices: Vec<_> = catalogue().iter().map(|p| p.price).collect();
    assert!(prices.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn find_by_id() {
    assert_eq!(find("optimum").map(|p| p.price), Some(45_000));
    assert!(find("platinum").is_none());
  }
}
