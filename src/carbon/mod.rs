//! Carbon emissions data intake domain.
//!
//! Types, constants, and validation/generation logic for the multi-step
//! data intake flow: company profile, a leap year of daily scope-1
//! measurements, annual scope-2 electricity data, four industry-specific
//! scope-3 dimensions, and a batch of satellite CO₂ observations. The
//! field names carried on the wire (`f_`-prefixed, plus Chinese keys in
//! scope-3 variable entries) are fixed by the ingestion backend.

pub mod generators;
pub mod validators;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::IbotError;

/// Required number of daily records: one per day of a leap year.
pub const DAILY_RECORD_COUNT: usize = 366;

/// Required number of scope-3 emission dimensions per company.
pub const SCOPE3_DIMENSION_COUNT: usize = 4;

/// Minimum number of satellite observation records.
pub const SATELLITE_MINIMUM_COUNT: usize = 800;

/// Global K constant in the daily emission formula.
pub const K_CONSTANT: f64 = 0.1;

/// National grid average emission factor, tCO₂ per MWh.
pub const GRID_EMISSION_FACTOR: f64 = 0.4419;

/// Industry classification used by the intake backend.
///
/// The Chinese labels are the wire values; the backend matches them
/// verbatim, so they must not be altered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    #[serde(rename = "金融机构（以商业银行为例）")]
    Finance,
    #[serde(rename = "交通运输业（以航空公司为例）")]
    Aviation,
    #[serde(rename = "数字科技行业（以云服务/互联网公司为例）")]
    DigitalTechnology,
    #[serde(rename = "新材料行业（以先进化工材料/复合材料为例）")]
    AdvancedMaterials,
    #[serde(rename = "制造业（以汽车制造为例）")]
    Manufacturing,
    #[serde(rename = "电子信息业（以智能手机制造为例）")]
    Electronics,
    #[serde(rename = "医疗行业（以大型综合医院为例）")]
    Healthcare,
    #[serde(rename = "电力行业（以火电厂为例）")]
    Power,
}

impl Industry {
    /// All industries, in menu order.
    pub fn all() -> [Industry; 8] {
        [
            Industry::Finance,
            Industry::Aviation,
            Industry::DigitalTechnology,
            Industry::AdvancedMaterials,
            Industry::Manufacturing,
            Industry::Electronics,
            Industry::Healthcare,
            Industry::Power,
        ]
    }

    /// The wire label, as the backend expects it.
    pub fn label(&self) -> &'static str {
        match self {
            Industry::Finance => "金融机构（以商业银行为例）",
            Industry::Aviation => "交通运输业（以航空公司为例）",
            Industry::DigitalTechnology => "数字科技行业（以云服务/互联网公司为例）",
            Industry::AdvancedMaterials => "新材料行业（以先进化工材料/复合材料为例）",
            Industry::Manufacturing => "制造业（以汽车制造为例）",
            Industry::Electronics => "电子信息业（以智能手机制造为例）",
            Industry::Healthcare => "医疗行业（以大型综合医院为例）",
            Industry::Power => "电力行业（以火电厂为例）",
        }
    }

    /// Short ASCII identifier used on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Industry::Finance => "finance",
            Industry::Aviation => "aviation",
            Industry::DigitalTechnology => "digital-technology",
            Industry::AdvancedMaterials => "advanced-materials",
            Industry::Manufacturing => "manufacturing",
            Industry::Electronics => "electronics",
            Industry::Healthcare => "healthcare",
            Industry::Power => "power",
        }
    }

    /// Sector dispersion parameter C in the daily emission formula.
    pub fn c_sector(&self) -> f64 {
        match self {
            Industry::Finance => 0.85,
            Industry::Aviation => 1.35,
            Industry::DigitalTechnology => 0.95,
            Industry::AdvancedMaterials => 1.25,
            Industry::Manufacturing => 1.20,
            Industry::Electronics => 1.05,
            Industry::Healthcare => 0.90,
            Industry::Power => 1.50,
        }
    }

    /// The four scope-3 dimensions this industry reports.
    pub fn scope3_template(&self) -> [Scope3TemplateEntry; 4] {
        match self {
            Industry::Finance => [
                Scope3TemplateEntry {
                    dimension: "投资与融资组合排放",
                    category: "类别15：投资",
                    formula: "排放量 = 投资金额 × 排放因子 × 摊销系数",
                    explanation: "按投资组合余额乘以行业平均碳强度估算。 覆盖表内信贷与自营投资。",
                },
                Scope3TemplateEntry {
                    dimension: "采购商品与服务",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 采购支出 × 排放因子",
                    explanation: "基于年度采购支出与支出型排放因子。 含IT服务与办公用品。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "按出行方式汇总人公里数。 差旅数据来自报销系统。",
                },
                Scope3TemplateEntry {
                    dimension: "租赁资产运营",
                    category: "类别8：上游租赁资产",
                    formula: "排放量 = 租赁面积 × 排放因子",
                    explanation: "网点与办公楼按面积折算能耗排放。 仅计入非自有物业。",
                },
            ],
            Industry::Aviation => [
                Scope3TemplateEntry {
                    dimension: "航空燃油上游排放",
                    category: "类别3：燃料与能源相关活动",
                    formula: "排放量 = 消耗量 × 排放因子",
                    explanation: "航油开采、炼制与运输环节的井到泵排放。 按年度加油量计算。",
                },
                Scope3TemplateEntry {
                    dimension: "机队设备制造",
                    category: "类别2：资本商品",
                    formula: "排放量 = 采购数量 × 排放因子 × 摊销系数",
                    explanation: "新购飞机与发动机的制造内涵排放。 按折旧年限摊销。",
                },
                Scope3TemplateEntry {
                    dimension: "采购商品与服务",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 采购支出 × 排放因子",
                    explanation: "机上餐食、地面服务与维修备件。 支出法估算。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "地面员工通勤与非执勤差旅。 不含机组执勤航段。",
                },
            ],
            Industry::DigitalTechnology => [
                Scope3TemplateEntry {
                    dimension: "采购商品与服务",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 采购支出 × 排放因子",
                    explanation: "服务器、网络设备与外包服务采购。 支出法估算。",
                },
                Scope3TemplateEntry {
                    dimension: "租赁数据中心资产",
                    category: "类别8：上游租赁资产",
                    formula: "排放量 = 租赁面积 × 排放因子",
                    explanation: "托管机房按机柜面积折算电力排放。 扣除绿电采购部分。",
                },
                Scope3TemplateEntry {
                    dimension: "能源上游排放",
                    category: "类别3：燃料与能源相关活动",
                    formula: "排放量 = 消耗量 × 排放因子",
                    explanation: "外购电力的输配损耗与上游排放。 按用电量比例折算。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "办公园区通勤班车与出差行程。 问卷抽样估算通勤距离。",
                },
            ],
            Industry::AdvancedMaterials => [
                Scope3TemplateEntry {
                    dimension: "采购原材料",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 消耗量 × 排放因子",
                    explanation: "树脂、纤维与化工前驱体的内涵碳。 按投料量计算。",
                },
                Scope3TemplateEntry {
                    dimension: "能源上游排放",
                    category: "类别3：燃料与能源相关活动",
                    formula: "排放量 = 消耗量 × 排放因子",
                    explanation: "蒸汽与电力的上游生产排放。 按能源台账折算。",
                },
                Scope3TemplateEntry {
                    dimension: "上游运输与配送",
                    category: "类别4：上游运输与配送",
                    formula: "排放量 = 活动数据 × 排放因子",
                    explanation: "原料入厂物流按吨公里核算。 含危化品专线运输。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "厂区通勤与技术交流差旅。 按人事出勤记录估算。",
                },
            ],
            Industry::Manufacturing => [
                Scope3TemplateEntry {
                    dimension: "采购零部件与原材料",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 采购支出 × 排放因子",
                    explanation: "钢材、电池与外购零部件的内涵碳。 按一级供应商口径。",
                },
                Scope3TemplateEntry {
                    dimension: "售出产品使用阶段",
                    category: "类别11：售出产品的使用",
                    formula: "排放量 = 活动数据 × 排放因子",
                    explanation: "按车型年销量与全生命周期行驶里程估算。 燃油与电耗分列。",
                },
                Scope3TemplateEntry {
                    dimension: "上游运输与配送",
                    category: "类别4：上游运输与配送",
                    formula: "排放量 = 活动数据 × 排放因子",
                    explanation: "零部件入厂与整车发运物流。 吨公里法核算。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "工厂班车与出差行程汇总。 按通勤调查折算。",
                },
            ],
            Industry::Electronics => [
                Scope3TemplateEntry {
                    dimension: "采购元器件与材料",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 采购支出 × 排放因子",
                    explanation: "芯片、屏幕与结构件的内涵碳。 芯片占比最高。",
                },
                Scope3TemplateEntry {
                    dimension: "售出产品使用阶段",
                    category: "类别11：售出产品的使用",
                    formula: "排放量 = 活动数据 × 排放因子",
                    explanation: "按销量、典型使用年限与日均充电量估算。 区分机型功耗。",
                },
                Scope3TemplateEntry {
                    dimension: "生产设备资本商品",
                    category: "类别2：资本商品",
                    formula: "排放量 = 采购数量 × 排放因子 × 摊销系数",
                    explanation: "产线设备制造内涵排放。 按设备寿命摊销。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "园区通勤与供应链巡检差旅。 按班车台账估算。",
                },
            ],
            Industry::Healthcare => [
                Scope3TemplateEntry {
                    dimension: "采购药品与医疗耗材",
                    category: "类别1：采购商品与服务",
                    formula: "排放量 = 采购支出 × 排放因子",
                    explanation: "药品、耗材与试剂的内涵碳。 支出法估算。",
                },
                Scope3TemplateEntry {
                    dimension: "医疗设备资本商品",
                    category: "类别2：资本商品",
                    formula: "排放量 = 采购数量 × 排放因子 × 摊销系数",
                    explanation: "影像与检验设备制造排放。 按折旧年限摊销。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "医护通勤与学术会议差旅。 按排班记录估算。",
                },
                Scope3TemplateEntry {
                    dimension: "能源上游排放",
                    category: "类别3：燃料与能源相关活动",
                    formula: "排放量 = 消耗量 × 排放因子",
                    explanation: "外购电力与蒸汽的上游排放。 按能耗台账折算。",
                },
            ],
            Industry::Power => [
                Scope3TemplateEntry {
                    dimension: "燃料与能源上游排放",
                    category: "类别3：燃料与能源相关活动",
                    formula: "排放量 = 消耗量 × 排放因子",
                    explanation: "电煤开采、洗选与运输排放。 按入厂煤量计算。",
                },
                Scope3TemplateEntry {
                    dimension: "发电设备资本商品",
                    category: "类别2：资本商品",
                    formula: "排放量 = 采购数量 × 排放因子 × 摊销系数",
                    explanation: "锅炉、汽轮机等大修与新增设备。 按服役年限摊销。",
                },
                Scope3TemplateEntry {
                    dimension: "上游运输与配送",
                    category: "类别4：上游运输与配送",
                    formula: "排放量 = 活动数据 × 排放因子",
                    explanation: "燃煤铁路与船运物流。 吨公里法核算。",
                },
                Scope3TemplateEntry {
                    dimension: "员工通勤与商务差旅",
                    category: "类别6/7：差旅与通勤",
                    formula: "排放量 = 活动人公里 × 排放因子",
                    explanation: "厂区通勤班车与检修差旅。 按考勤记录估算。",
                },
            ],
        }
    }
}

impl std::fmt::Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Industry {
    type Err = IbotError;

    /// Accepts the ASCII slug or the exact wire label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Industry::all()
            .into_iter()
            .find(|i| i.slug() == needle || i.label() == needle)
            .ok_or_else(|| {
                IbotError::Precondition(format!(
                    "unknown industry '{needle}' (expected one of: {})",
                    Industry::all().map(|i| i.slug()).join(", ")
                ))
            })
    }
}

/// One row of an industry's scope-3 reporting template.
#[derive(Debug, Clone, Copy)]
pub struct Scope3TemplateEntry {
    pub dimension: &'static str,
    pub category: &'static str,
    pub formula: &'static str,
    pub explanation: &'static str,
}

/// Company master data collected in the first wizard step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(rename = "f_company_name")]
    pub name: String,
    #[serde(rename = "f_company_number")]
    pub number: String,
    #[serde(rename = "f_industry")]
    pub industry: Industry,
    #[serde(rename = "f_region")]
    pub region: String,
    #[serde(
        rename = "f_registration_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_date: Option<NaiveDate>,
}

/// One day of scope-1 measurements and the derived emission value.
///
/// `daily_emissions = (peak - background) × wind_speed × downwind_distance
/// × C_sector × K × A`, rounded to two decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyData {
    #[serde(rename = "f_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "f_company_number")]
    pub company_number: String,
    #[serde(rename = "f_date")]
    pub date: NaiveDate,
    #[serde(rename = "f_vbg")]
    pub background_ppm: f64,
    #[serde(rename = "f_vpeak")]
    pub peak_ppm: f64,
    #[serde(
        rename = "f_vpeak_vbg",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub peak_minus_background: Option<f64>,
    #[serde(rename = "f_u")]
    pub wind_speed: f64,
    #[serde(rename = "f_delta_x")]
    pub downwind_distance: f64,
    #[serde(
        rename = "f_c_sector",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sector_parameter: Option<f64>,
    #[serde(rename = "f_k", default, skip_serializing_if = "Option::is_none")]
    pub k_constant: Option<f64>,
    #[serde(rename = "f_a", default, skip_serializing_if = "Option::is_none")]
    pub company_parameter: Option<f64>,
    #[serde(
        rename = "f_daily_emissions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub daily_emissions: Option<f64>,
}

/// Annual purchased-electricity data (scope 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope2Data {
    #[serde(rename = "f_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "f_company_number")]
    pub company_number: String,
    #[serde(rename = "f_year")]
    pub year: i32,
    #[serde(rename = "f_electricity_consumption")]
    pub electricity_consumption_kwh: f64,
    #[serde(
        rename = "f_emission_factor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub emission_factor: Option<f64>,
    #[serde(
        rename = "f_scope2_emissions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scope2_emissions: Option<f64>,
}

/// One named variable inside a scope-3 dimension.
///
/// The Chinese keys are the storage format of `f_emission_detail` and are
/// fixed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope3Variable {
    #[serde(rename = "名称")]
    pub name: String,
    #[serde(rename = "数值")]
    pub value: f64,
    #[serde(rename = "单位")]
    pub unit: String,
}

/// One of the four industry-specific scope-3 emission dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope3Dimension {
    #[serde(rename = "f_emission_dimension")]
    pub dimension: String,
    #[serde(rename = "f_emission_type")]
    pub emission_type: String,
    #[serde(rename = "f_emission_detail")]
    pub variables: Vec<Scope3Variable>,
    #[serde(rename = "f_calculation_formula")]
    pub formula: String,
    #[serde(
        rename = "f_deduction_explanation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,
    #[serde(
        rename = "f_emission_value",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub emission_value: Option<f64>,
}

/// Annual scope-3 report: four dimensions plus their total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope3Data {
    #[serde(rename = "f_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "f_company_number")]
    pub company_number: String,
    #[serde(rename = "f_company_name")]
    pub company_name: String,
    #[serde(rename = "f_company_industry")]
    pub industry: Industry,
    #[serde(rename = "f_year")]
    pub year: i32,
    pub dimensions: Vec<Scope3Dimension>,
    #[serde(
        rename = "f_scope3_total",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<f64>,
}

/// One satellite CO₂ column observation near the company site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteData {
    #[serde(rename = "f_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "f_company_number")]
    pub company_number: String,
    #[serde(rename = "f_observation_date")]
    pub observation_date: NaiveDate,
    #[serde(rename = "f_latitude")]
    pub latitude: f64,
    #[serde(rename = "f_longitude")]
    pub longitude: f64,
    #[serde(rename = "f_CO2_concentration")]
    pub co2_concentration: f64,
    #[serde(
        rename = "f_observation_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub observation_time: Option<NaiveTime>,
}

/// The complete bundle submitted to `import_carbon_data` in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataImportPayload {
    pub company: CompanyInfo,
    #[serde(rename = "dailyData")]
    pub daily_data: Vec<DailyData>,
    pub scope2: Scope2Data,
    pub scope3: Scope3Data,
    #[serde(rename = "satelliteData")]
    pub satellite_data: Vec<SatelliteData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Daily emission formula, rounded to two decimals.
pub fn daily_emissions(
    peak_minus_background: f64,
    wind_speed: f64,
    downwind_distance: f64,
    c_sector: f64,
    company_parameter: f64,
) -> f64 {
    round_to(
        peak_minus_background * wind_speed * downwind_distance * c_sector * K_CONSTANT
            * company_parameter,
        2,
    )
}

/// Scope-2 emission formula: kWh are converted to MWh before applying the
/// grid factor. Rounded to two decimals.
pub fn scope2_emissions(electricity_consumption_kwh: f64, emission_factor: f64) -> f64 {
    round_to(electricity_consumption_kwh / 1000.0 * emission_factor, 2)
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
