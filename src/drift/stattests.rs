//! 两样本统计检验
//!
//! 检验分两类：返回 p 值的检验（卡方、比例 z 检验、KS），p 值低于阈值视为漂移；
//! 返回距离的检验（Jensen-Shannon、归一化 Wasserstein），距离不低于阈值视为漂移。

use std::collections::{BTreeMap, BTreeSet};

/// 参考集行数不超过此值时使用 p 值检验
pub const SMALL_REFERENCE_ROWS: usize = 1000;

/// 唯一值不超过此值的数值列按类别处理
pub const LOW_CARDINALITY: usize = 5;

/// KS 检验使用精确分布的最大样本量
const KS_EXACT_MAX_N: usize = 10_000;

/// 零频率的替代值，避免 log(0)
const ZERO_FREQUENCY: f64 = 0.0001;

/// Wasserstein 归一化时标准差的下限
const MIN_STD: f64 = 0.001;

/// 统计检验种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTest {
    ChiSquare,
    ZTest,
    KolmogorovSmirnov,
    JensenShannon,
    Wasserstein,
}

impl StatTest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChiSquare => "chisquare",
            Self::ZTest => "z",
            Self::KolmogorovSmirnov => "ks",
            Self::JensenShannon => "jensenshannon",
            Self::Wasserstein => "wasserstein",
        }
    }

    /// 检验结果是否为 p 值
    pub fn is_p_value(&self) -> bool {
        matches!(self, Self::ChiSquare | Self::ZTest | Self::KolmogorovSmirnov)
    }

    /// 按阈值判断是否漂移
    pub fn detected(&self, score: f64, threshold: f64) -> bool {
        if self.is_p_value() {
            score < threshold
        } else {
            score >= threshold
        }
    }
}

/// 按参考集大小与唯一值数选择默认检验
///
/// `numerical` 表示列在映射中声明为数值列；`n_unique` 是两份数据合并后的唯一值数。
pub fn default_test(numerical: bool, reference_rows: usize, n_unique: usize) -> StatTest {
    let categorical_small = if n_unique > 2 {
        StatTest::ChiSquare
    } else {
        StatTest::ZTest
    };

    if reference_rows <= SMALL_REFERENCE_ROWS {
        if numerical && n_unique > LOW_CARDINALITY {
            StatTest::KolmogorovSmirnov
        } else {
            categorical_small
        }
    } else if numerical && n_unique > LOW_CARDINALITY {
        StatTest::Wasserstein
    } else {
        StatTest::JensenShannon
    }
}

fn counts<'a>(values: &[&'a str]) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    counts
}

fn union_keys<'a>(reference: &[&'a str], current: &[&'a str]) -> BTreeSet<&'a str> {
    reference.iter().chain(current).copied().collect()
}

/// 卡方拟合优度检验的 p 值
///
/// 期望频数为参考集比例乘以当前集大小。
pub fn chi_square_test(reference: &[&str], current: &[&str]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 1.0;
    }

    let keys = union_keys(reference, current);
    if keys.len() < 2 {
        return 1.0;
    }

    let reference_counts = counts(reference);
    let current_counts = counts(current);
    let k_norm = current.len() as f64 / reference.len() as f64;

    let mut statistic = 0.0;
    for key in &keys {
        let observed = current_counts.get(key).copied().unwrap_or(0) as f64;
        let expected = reference_counts.get(key).copied().unwrap_or(0) as f64 * k_norm;
        if expected == 0.0 {
            if observed > 0.0 {
                return 0.0;
            }
            continue;
        }
        statistic += (observed - expected).powi(2) / expected;
    }

    chi2_sf(statistic, (keys.len() - 1) as f64)
}

/// 两比例差异 z 检验（双侧）的 p 值
pub fn z_test(reference: &[&str], current: &[&str]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 1.0;
    }

    let keys = union_keys(reference, current);
    let Some(first) = keys.iter().next() else {
        return 1.0;
    };
    if keys.len() == 1 {
        return 1.0;
    }

    let share = |values: &[&str]| {
        values.iter().filter(|v| *v != first).count() as f64 / values.len() as f64
    };
    let n1 = reference.len() as f64;
    let n2 = current.len() as f64;
    let p1 = share(reference);
    let p2 = share(current);
    let pooled = (p1 * n1 + p2 * n2) / (n1 + n2);
    let variance = pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2);
    if variance <= 0.0 {
        return 1.0;
    }

    let z = (p1 - p2) / variance.sqrt();
    2.0 * (1.0 - normal_cdf(z.abs()))
}

/// 两样本 Kolmogorov-Smirnov 检验（双侧）的 p 值
///
/// 两份样本都不超过 `KS_EXACT_MAX_N` 行时用精确分布，否则用渐近分布。
pub fn ks_test(reference: &[f64], current: &[f64]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 1.0;
    }

    let d = ks_statistic(reference, current);
    let (n1, n2) = (reference.len(), current.len());
    if n1.max(n2) <= KS_EXACT_MAX_N {
        ks_exact_p_value(n1, n2, d)
    } else {
        ks_asymptotic_p_value(n1, n2, d)
    }
}

/// 精确 p 值：(0,0) 到 (m,n) 的格点路径中，触及 |i/m - j/n| >= d 的比例
///
/// 逐列递推的是“到达 (i, j) 且始终在带内的路径数 / C(i+j, i)”，取值保持在 [0, 1]。
fn ks_exact_p_value(n1: usize, n2: usize, d: f64) -> f64 {
    let (m, n) = (n1.max(n2) as i64, n1.min(n2) as i64);
    let g = gcd(m, n);
    let lcm = (m / g) * n;
    let h = (d * lcm as f64).round() as i64;
    if h == 0 {
        return 1.0;
    }

    // |i/m - j/n| >= h/lcm 等价于 |i*n - j*m| >= h*g
    let bound = h * g;
    let inside = |i: i64, j: i64| (i * n - j * m).abs() < bound;

    let mut column = vec![0.0_f64; n as usize + 1];
    column[0] = 1.0;
    for j in 1..=n {
        column[j as usize] = if inside(0, j) { column[j as usize - 1] } else { 0.0 };
    }

    for i in 1..=m {
        if !inside(i, 0) {
            column[0] = 0.0;
        }
        for j in 1..=n {
            let k = j as usize;
            column[k] = if inside(i, j) {
                (column[k] * i as f64 + column[k - 1] * j as f64) / (i + j) as f64
            } else {
                0.0
            };
        }
    }

    (1.0 - column[n as usize]).clamp(0.0, 1.0)
}

fn ks_asymptotic_p_value(n1: usize, n2: usize, d: f64) -> f64 {
    let (n1, n2) = (n1 as f64, n2 as f64);
    let en = (n1 * n2 / (n1 + n2)).sqrt();
    kolmogorov_q((en + 0.12 + 0.11 / en) * d)
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// 两个经验分布函数之间的最大距离
pub fn ks_statistic(reference: &[f64], current: &[f64]) -> f64 {
    let a = sorted(reference);
    let b = sorted(current);
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    d
}

/// 类别列的 Jensen-Shannon 距离
pub fn jensen_shannon_categorical(reference: &[&str], current: &[&str]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 0.0;
    }

    let keys = union_keys(reference, current);
    let reference_counts = counts(reference);
    let current_counts = counts(current);
    let percents = |counts: &BTreeMap<&str, usize>, total: usize| -> Vec<f64> {
        keys.iter()
            .map(|k| counts.get(k).copied().unwrap_or(0) as f64 / total as f64)
            .collect()
    };

    jensen_shannon(
        &fill_zeroes(percents(&reference_counts, reference.len())),
        &fill_zeroes(percents(&current_counts, current.len())),
    )
}

/// 以参考集标准差归一化的一阶 Wasserstein 距离
pub fn wasserstein_normed(reference: &[f64], current: &[f64]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 0.0;
    }
    wasserstein_distance(reference, current) / std_dev(reference).max(MIN_STD)
}

/// 一维经验分布之间的 Wasserstein 距离
pub fn wasserstein_distance(u: &[f64], v: &[f64]) -> f64 {
    let u = sorted(u);
    let v = sorted(v);
    let mut all: Vec<f64> = u.iter().chain(&v).copied().collect();
    all.sort_by(f64::total_cmp);

    let (nu, nv) = (u.len() as f64, v.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut distance = 0.0;

    for window in all.windows(2) {
        let (x, next) = (window[0], window[1]);
        while i < u.len() && u[i] <= x {
            i += 1;
        }
        while j < v.len() && v[j] <= x {
            j += 1;
        }
        distance += (i as f64 / nu - j as f64 / nv).abs() * (next - x);
    }

    distance
}

fn jensen_shannon(p: &[f64], q: &[f64]) -> f64 {
    let sum_p: f64 = p.iter().sum();
    let sum_q: f64 = q.iter().sum();
    let mut divergence = 0.0;

    for (p, q) in p.iter().zip(q) {
        let (p, q) = (p / sum_p, q / sum_q);
        let m = (p + q) / 2.0;
        if p > 0.0 {
            divergence += p * (p / m).ln();
        }
        if q > 0.0 {
            divergence += q * (q / m).ln();
        }
    }

    (divergence / 2.0).max(0.0).sqrt()
}

fn fill_zeroes(mut percents: Vec<f64>) -> Vec<f64> {
    for p in &mut percents {
        if *p == 0.0 {
            *p = ZERO_FREQUENCY;
        }
    }
    percents
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// 卡方分布的生存函数
pub fn chi2_sf(x: f64, dof: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    gamma_q(dof / 2.0, x / 2.0)
}

/// 标准正态分布函数
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let r = t
        * (-z * z - 1.265_512_23
            + t * (1.000_023_68
                + t * (0.374_091_96
                    + t * (0.096_784_18
                        + t * (-0.186_288_06
                            + t * (0.278_868_07
                                + t * (-1.135_203_98
                                    + t * (1.488_515_87
                                        + t * (-0.822_152_23 + t * 0.170_872_77)))))))))
            .exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000_000_000_190_015;
    for c in COEFFICIENTS {
        y += 1.0;
        series += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * series / x).ln()
}

/// 正则化上不完全伽马函数 Q(a, x)
fn gamma_q(a: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 500;
    const EPS: f64 = 1e-14;
    const FPMIN: f64 = 1e-300;

    let gln = ln_gamma(a);

    if x < a + 1.0 {
        // 级数展开求 P(a, x)
        let mut ap = a;
        let mut del = 1.0 / a;
        let mut sum = del;
        for _ in 0..MAX_ITERATIONS {
            ap += 1.0;
            del *= x / ap;
            sum += del;
            if del.abs() < sum.abs() * EPS {
                break;
            }
        }
        let p = sum * (-x + a * x.ln() - gln).exp();
        (1.0 - p).clamp(0.0, 1.0)
    } else {
        // 连分式求 Q(a, x)
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / FPMIN;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=MAX_ITERATIONS {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < FPMIN {
                d = FPMIN;
            }
            c = b + an / c;
            if c.abs() < FPMIN {
                c = FPMIN;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < EPS {
                break;
            }
        }
        ((-x + a * x.ln() - gln).exp() * h).clamp(0.0, 1.0)
    }
}

/// Kolmogorov 分布的生存函数 Q_KS(λ)
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous_term = 0.0;

    for j in 1..=100 {
        let j = j as f64;
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= 1e-3 * previous_term || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous_term = term.abs();
    }

    // 不收敛时 λ 很小，分布值趋近 1
    1.0
}
