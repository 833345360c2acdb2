// crates/hl_exchange/src/set.rs

//! 交换集合
//!
//! 一个通道组装配出的所有映射，按交换类型有序存放。

use std::collections::BTreeMap;

use hl_foundation::{HlError, HlResult};
use hl_mapping::Mapping;

use crate::kind::ExchangeKind;
use crate::reverse::ReverseChannel;

/// 交换集合
#[derive(Debug, Clone, Default)]
pub struct ExchangeSet {
    mappings: BTreeMap<ExchangeKind, Mapping>,
    reverse: BTreeMap<ExchangeKind, ReverseChannel>,
}

impl ExchangeSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入静态映射
    pub fn insert(&mut self, kind: ExchangeKind, mapping: Mapping) {
        self.mappings.insert(kind, mapping);
    }

    /// 插入反向通道
    pub fn insert_reverse(&mut self, channel: ReverseChannel) {
        self.reverse.insert(channel.kind(), channel);
    }

    /// 查询映射（反向通道返回其当前映射）
    pub fn get(&self, kind: ExchangeKind) -> Option<&Mapping> {
        self.mappings
            .get(&kind)
            .or_else(|| self.reverse.get(&kind).map(ReverseChannel::mapping))
    }

    /// 查询映射，缺失时报错
    pub fn require(&self, kind: ExchangeKind) -> HlResult<&Mapping> {
        self.get(kind)
            .ok_or_else(|| HlError::config(format!("交换 {kind} ({}) 未装配", kind.group())))
    }

    /// 查询反向通道
    pub fn reverse(&self, kind: ExchangeKind) -> Option<&ReverseChannel> {
        self.reverse.get(&kind)
    }

    /// 可变查询反向通道
    pub fn reverse_mut(&mut self, kind: ExchangeKind) -> Option<&mut ReverseChannel> {
        self.reverse.get_mut(&kind)
    }

    /// 是否包含该交换
    pub fn contains(&self, kind: ExchangeKind) -> bool {
        self.mappings.contains_key(&kind) || self.reverse.contains_key(&kind)
    }

    /// 交换数量
    pub fn len(&self) -> usize {
        self.mappings.len() + self.reverse.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty() && self.reverse.is_empty()
    }

    /// 按类型顺序遍历所有映射
    pub fn iter(&self) -> impl Iterator<Item = (ExchangeKind, &Mapping)> + '_ {
        let mut all: Vec<(ExchangeKind, &Mapping)> = self
            .mappings
            .iter()
            .map(|(k, m)| (*k, m))
            .chain(self.reverse.iter().map(|(k, c)| (*k, c.mapping())))
            .collect();
        all.sort_by_key(|(k, _)| *k);
        all.into_iter()
    }

    /// 应用静态映射：`next = mask ⊙ previous + operator · input`
    pub fn apply(&self, kind: ExchangeKind, previous: &[f64], input: &[f64]) -> HlResult<Vec<f64>> {
        self.require(kind)?.apply(previous, input)
    }

    /// 合并另一个集合，同类型以 `other` 为准
    pub fn merge(&mut self, other: ExchangeSet) {
        self.mappings.extend(other.mappings);
        self.reverse.extend(other.reverse);
    }
}
