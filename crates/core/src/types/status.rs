//! Closed value sets used on the wire and in the database.
//!
//! Every enum serializes as its Turkish label (`"Giriş"`, `"Onay Bekliyor"`,
//! ...) which is the form clients display and send back. In Postgres they
//! are stored as native enums in the `envanter` schema with snake_case
//! variant names.

/// Defines a labelled enum with `ALL`, `label()`, `Display` and `FromStr`.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $db:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(type_name = $db, rename_all = "snake_case"))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every value in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The label shown to users and used on the wire.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Labels of every value, in declaration order.
            #[must_use]
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.label()).collect()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

labelled_enum! {
    /// Direction of a stock movement.
    MovementDirection as "envanter.movement_direction" {
        In => "Giriş",
        Out => "Çıkış",
    }
}

labelled_enum! {
    /// Material category.
    Category as "envanter.material_category" {
        Stationery => "Kırtasiye",
        Cleaning => "Temizlik",
        OfficeEquipment => "Ofis Ekipmanı",
        Kitchen => "Mutfak",
        Technical => "Teknik",
        Other => "Diğer",
    }
}

labelled_enum! {
    /// Unit a material is counted in.
    Unit as "envanter.material_unit" {
        Piece => "Adet",
        Pack => "Paket",
        Box => "Kutu",
        Litre => "Litre",
        Kilogram => "Kg",
        Parcel => "Koli",
    }
}

labelled_enum! {
    /// User role with different permission levels.
    #[derive(Default)]
    UserRole as "envanter.user_role" {
        /// Full access including user management.
        Admin => "Admin",
        /// May review requests in addition to regular work.
        Manager => "Yönetici",
        /// Regular staff: records movements, requests and orders.
        #[default]
        User => "Kullanıcı",
        /// Read-only access.
        Viewer => "Görüntüleyici",
    }
}

impl UserRole {
    /// Whether this role may approve or reject material requests.
    #[must_use]
    pub const fn can_review_requests(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Whether this role may perform any mutation.
    #[must_use]
    pub const fn can_write(self) -> bool {
        !matches!(self, Self::Viewer)
    }

    /// Whether this role may list and create users.
    #[must_use]
    pub const fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin)
    }
}

labelled_enum! {
    /// Priority of a material request or a depletion prediction.
    #[derive(Default)]
    Priority as "envanter.priority" {
        Low => "Düşük",
        #[default]
        Normal => "Normal",
        High => "Yüksek",
        Urgent => "Acil",
    }
}

impl Priority {
    /// Sort key with the most urgent first.
    #[must_use]
    pub const fn urgency_rank(self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }
}

labelled_enum! {
    /// Material request status.
    #[derive(Default)]
    RequestStatus as "envanter.request_status" {
        #[default]
        Pending => "Beklemede",
        Approved => "Onaylandı",
        Rejected => "Reddedildi",
    }
}

labelled_enum! {
    /// Purchase order status, in lifecycle order.
    #[derive(Default)]
    OrderStatus as "envanter.order_status" {
        #[default]
        AwaitingApproval => "Onay Bekliyor",
        Approved => "Onaylandı",
        InTransit => "Yolda",
        Delivered => "Teslim Edildi",
    }
}

labelled_enum! {
    /// Stock count status.
    #[derive(Default)]
    CountStatus as "envanter.count_status" {
        #[default]
        Planned => "Planlandı",
        InProgress => "Devam Ediyor",
        Completed => "Tamamlandı",
    }
}

labelled_enum! {
    /// Stock status derived from current stock and the min/max levels.
    ///
    /// Never stored; see [`crate::ledger::classify`].
    StockStatus as "envanter.stock_status" {
        Critical => "Kritik",
        Normal => "Normal",
        Excess => "Fazla",
    }
}

labelled_enum! {
    /// Kind of change recorded in the audit log.
    AuditAction as "envanter.audit_action" {
        Create => "Oluşturma",
        Update => "Güncelleme",
        Delete => "Silme",
        Login => "Giriş",
        Logout => "Çıkış",
        Approve => "Onay",
        Reject => "Red",
        StockIn => "Stok Girişi",
        StockOut => "Stok Çıkışı",
    }
}

impl From<MovementDirection> for AuditAction {
    fn from(direction: MovementDirection) -> Self {
        match direction {
            MovementDirection::In => Self::StockIn,
            MovementDirection::Out => Self::StockOut,
        }
    }
}

labelled_enum! {
    /// Area of the application an audit entry belongs to.
    AuditModule as "envanter.audit_module" {
        Material => "Malzeme",
        Movement => "Stok Hareketi",
        Request => "Talep",
        Order => "Sipariş",
        Supplier => "Tedarikçi",
        Location => "Lokasyon",
        StockCount => "Sayım",
        User => "Kullanıcı",
        Auth => "Oturum",
        Budget => "Bütçe",
    }
}

labelled_enum! {
    /// What a notification is about.
    NotificationKind as "envanter.notification_kind" {
        CriticalStock => "Kritik Stok",
        RequestApproved => "Talep Onaylandı",
        RequestRejected => "Talep Reddedildi",
        OrderUpdate => "Sipariş Güncelleme",
        BudgetWarning => "Bütçe Uyarısı",
        System => "Sistem",
    }
}
