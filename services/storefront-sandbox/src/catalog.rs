//! Seeded packages the sandbox sells.

use sf_api_types::PurchaseType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Availability {
    Single,
    Subscribe,
    Both,
}

impl Availability {
    /// Value of `data-package-type` on the package widget.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Subscribe => "subscribe",
            Self::Both => "both",
        }
    }

    pub(crate) fn allows(&self, purchase_type: PurchaseType) -> bool {
        match self {
            Self::Both => true,
            Self::Single => purchase_type == PurchaseType::Single,
            Self::Subscribe => purchase_type == PurchaseType::Subscribe,
        }
    }
}

/// A variable the customer has to fill in before the package is added.
#[derive(Debug, Clone)]
pub(crate) struct OptionField {
    pub(crate) name: &'static str,
    pub(crate) label: &'static str,
    pub(crate) choices: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub(crate) struct Package {
    pub(crate) id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    pub(crate) price: f64,
    pub(crate) availability: Availability,
    pub(crate) max_quantity: Option<u32>,
    pub(crate) options: Vec<OptionField>,
    /// Seconds until the offer ends, rendered as a live countdown.
    pub(crate) countdown_secs: Option<u64>,
}

impl Package {
    pub(crate) fn needs_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub(crate) fn quantity_field(&self) -> String {
        format!("quantity[{}]", self.id)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Catalog {
    packages: Vec<Package>,
}

impl Catalog {
    pub(crate) fn seeded() -> Self {
        Self {
            packages: vec![
                Package {
                    id: "activation",
                    name: "تفعيل",
                    description: "تفعيل حسابك في السيرفر والحصول على مميزات حصرية",
                    price: 14.0,
                    availability: Availability::Single,
                    max_quantity: Some(1),
                    options: Vec::new(),
                    countdown_secs: None,
                },
                Package {
                    id: "priority-entry",
                    name: "أولوية الدخول السريع (24H)",
                    description: "احصل على أولوية دخول للسيرفر وتخطي قوائم الانتظار",
                    price: 30.0,
                    availability: Availability::Both,
                    max_quantity: Some(10),
                    options: Vec::new(),
                    countdown_secs: Some(6 * 60 * 60),
                },
                Package {
                    id: "interview",
                    name: "مقابلة فورية",
                    description: "احصل على مقابلة فورية مع إدارة السيرفر عبر ديسكورد",
                    price: 30.0,
                    availability: Availability::Single,
                    max_quantity: None,
                    options: vec![OptionField {
                        name: "slot",
                        label: "وقت المقابلة",
                        choices: &["18:00", "20:00", "22:00"],
                    }],
                    countdown_secs: None,
                },
            ],
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }
}
