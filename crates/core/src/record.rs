use serde::{Deserialize, Serialize};

/// Default number of records a single report page accepts.
pub const DEFAULT_RECORD_CAPACITY: usize = 20;

/// Marker printed wherever a field is blank.
pub const PLACEHOLDER: &str = "-";

/// 表單中可填寫的欄位，順序即卡片繪製順序。 / Record fields in canonical card order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    ConfirmedSource,
    UsingCompany,
    CompanyName,
    StoreUrl,
    OrderName,
    Phone,
}

impl RecordField {
    /// Every field in the order cards list them.
    pub const ALL: [RecordField; 6] = [
        RecordField::ConfirmedSource,
        RecordField::UsingCompany,
        RecordField::CompanyName,
        RecordField::StoreUrl,
        RecordField::OrderName,
        RecordField::Phone,
    ];

    /// Label drawn above the field's body lines.
    pub const fn label(self) -> &'static str {
        match self {
            RecordField::ConfirmedSource => "이용중인 업체 확인된곳",
            RecordField::UsingCompany => "이용업체",
            RecordField::CompanyName => "업체명",
            RecordField::StoreUrl => "업체 판매처 URL",
            RecordField::OrderName => "주문자명(주문 시 사용)",
            RecordField::Phone => "연락처",
        }
    }

    /// Machine-friendly key used by scripts and JSON input.
    pub const fn key(self) -> &'static str {
        match self {
            RecordField::ConfirmedSource => "confirmed_source",
            RecordField::UsingCompany => "using_company",
            RecordField::CompanyName => "company_name",
            RecordField::StoreUrl => "store_url",
            RecordField::OrderName => "order_name",
            RecordField::Phone => "phone",
        }
    }

    /// Looks a field up by its [`key`](Self::key).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

/// 一筆檢舉紀錄。 / One complaint entry as submitted through the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Record {
    /// Returns the trimmed value of `field`, or `None` when blank.
    pub fn get(&self, field: RecordField) -> Option<&str> {
        let raw = match field {
            RecordField::ConfirmedSource => &self.confirmed_source,
            RecordField::UsingCompany => &self.using_company,
            RecordField::CompanyName => &self.company_name,
            RecordField::StoreUrl => &self.store_url,
            RecordField::OrderName => &self.order_name,
            RecordField::Phone => &self.phone,
        };
        raw.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }

    /// Sets `field`; blank input clears it.
    pub fn set(&mut self, field: RecordField, value: impl Into<String>) {
        let value = value.into();
        let stored = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
        match field {
            RecordField::ConfirmedSource => self.confirmed_source = stored,
            RecordField::UsingCompany => self.using_company = stored,
            RecordField::CompanyName => self.company_name = stored,
            RecordField::StoreUrl => self.store_url = stored,
            RecordField::OrderName => self.order_name = stored,
            RecordField::Phone => self.phone = stored,
        }
    }

    /// Like [`get`](Self::get) but substitutes [`PLACEHOLDER`].
    pub fn display(&self, field: RecordField) -> &str {
        self.get(field).unwrap_or(PLACEHOLDER)
    }

    /// Field/value pairs in canonical card order.
    pub fn fields(&self) -> impl Iterator<Item = (RecordField, Option<&str>)> + '_ {
        RecordField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    /// `true` when every field is blank.
    pub fn is_blank(&self) -> bool {
        self.fields().all(|(_, value)| value.is_none())
    }
}

/// 已檢舉完成的公司。 / A company already reported or resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedCompany {
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ReportedCompany {
    /// Builds an entry, returning `None` when the company name is blank.
    pub fn new(company: impl Into<String>, url: Option<String>) -> Option<Self> {
        let company = company.into().trim().to_string();
        if company.is_empty() {
            return None;
        }
        let url = url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Some(Self { company, url })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Ordered record sequence with a hard upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordList {
    records: Vec<Record>,
    capacity: usize,
}

impl Default for RecordList {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECORD_CAPACITY)
    }
}

impl RecordList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// 新增紀錄；已滿時原樣退回。 / Appends a record, handing it back when the list is full.
    pub fn push(&mut self, record: Record) -> Result<usize, Record> {
        if self.is_full() {
            return Err(record);
        }
        self.records.push(record);
        Ok(self.records.len())
    }

    pub fn pop(&mut self) -> Option<Record> {
        self.records.pop()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Replaces the contents wholesale, keeping at most `capacity` entries.
    /// Returns how many trailing records were dropped to fit.
    pub(crate) fn replace(&mut self, records: Vec<Record>) -> usize {
        let dropped = records.len().saturating_sub(self.capacity);
        if dropped > 0 {
            log::warn!(
                "dropping {dropped} of {} records beyond capacity {}",
                records.len(),
                self.capacity
            );
        }
        self.records = records;
        self.records.truncate(self.capacity);
        dropped
    }
}
