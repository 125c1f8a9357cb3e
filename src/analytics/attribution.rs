//! 推广标签与广告账户名称的归因匹配
//!
//! 只做忽略大小写、去除首尾空白的精确比较，不做模糊匹配。
//! 匹配不到时不归因，对应的花费 / 展示 / 点击保持为 0。

use std::collections::HashMap;

/// 归一化后的归因键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributionKey(String);

impl AttributionKey {
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 标签与账户名是否指向同一推广
pub fn labels_match(label: &str, account_name: &str) -> bool {
    let key = AttributionKey::new(label);
    !key.is_empty() && key == AttributionKey::new(account_name)
}

/// 在账户名列表中查找与标签匹配的第一个账户名
pub fn find_account<'a, S: AsRef<str>>(label: &str, account_names: &'a [S]) -> Option<&'a str> {
    account_names
        .iter()
        .map(AsRef::as_ref)
        .find(|name| labels_match(label, name))
}

/// 一个 bot 下所有推广标签的归因索引
///
/// 多个推广可以共享同一标签；同一归一化键下以第一次出现的原始标签作为展示名。
#[derive(Debug, Default, Clone)]
pub struct AttributionResolver {
    labels: HashMap<AttributionKey, String>,
}

impl AttributionResolver {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for label in labels {
            let label = label.as_ref();
            let key = AttributionKey::new(label);
            if key.is_empty() {
                continue;
            }
            map.entry(key).or_insert_with(|| label.trim().to_string());
        }
        Self { labels: map }
    }

    /// 账户名对应的推广标签
    pub fn resolve(&self, account_name: &str) -> Option<&str> {
        self.labels
            .get(&AttributionKey::new(account_name))
            .map(String::as_str)
    }

    /// 将 (外部账户 id, 账户名) 映射为 外部账户 id -> 推广标签，未匹配的账户被丢弃
    pub fn resolve_accounts<'a, I>(&self, accounts: I) -> HashMap<i64, String>
    where
        I: IntoIterator<Item = (i64, &'a str)>,
    {
        accounts
            .into_iter()
            .filter_map(|(id, name)| self.resolve(name).map(|label| (id, label.to_string())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
