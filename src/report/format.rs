//! Terminal output for a calculation and for the static tables.

use crate::domain::{ClassCode, PaymentRequirement};
use crate::report::PromotionReport;
use crate::tables::{RadiusRule, RADIUS_TABLE, change_kind, compare_classes, group_of, payment_required, time_to_promotion};

/// Summary of one calculation, in the order the report presents it.
pub fn format_summary(report: &PromotionReport) -> String {
    let mut out = String::new();

    out.push_str("=== promocao - Promoção de Classe ===\n");
    out.push_str(&format!("Processo: {}\n", report.numero_processo));
    out.push_str(&format!(
        "Classe: {} -> {} (grupo {} -> {})\n",
        report.classe_atual, report.classe_proposta, report.grupo_atual, report.grupo_proposto
    ));
    out.push_str(&format!("Distância máxima ao contorno protegido: dmax = {} km\n", report.dmax));
    out.push_str(&format!(
        "Município e UF da estação: {}/{}\n",
        report.municipio_proposto, report.uf_proposta
    ));

    out.push_str(&format!(
        "\n{} municípios com área urbana atingida pelo contorno protegido:\n",
        report.municipios_afetados.len()
    ));
    for m in &report.municipios_afetados {
        out.push_str(&format!("  {m}\n"));
    }

    out.push_str(&format!("\nPopulação total dos municípios cobertos: Ptot = {}\n", report.ptot));
    out.push_str(&format!(
        "Município de referência: {}/{}\n",
        report.municipio_referencia, report.uf_proposta
    ));
    out.push_str(&format!(
        "Valores de referência: Vab = R$ {:.2} e Vbc = R$ {:.2}\n",
        report.valor_ab, report.valor_bc
    ));
    out.push_str(&format!("População do município de referência: Pref = {}\n", report.pref));
    out.push_str(&format!("Tcp: {}\n", report.tcp));
    match report.vpc.value() {
        Some(v) => out.push_str(&format!("Valor da promoção de classe: Vpc = R$ {v:.2}\n")),
        None => out.push_str(&format!("Valor da promoção de classe: Vpc = {}\n", report.vpc)),
    }
    if let (Some(value), Some(date)) = (report.ipca, &report.data_ipca) {
        out.push_str(&format!("Valor corrigido pelo IPCA ({date}): R$ {value:.2}\n"));
    }
    if let Some(path) = &report.caminho_mapa_temp {
        out.push_str(&format!("Mapa: {path}\n"));
    }

    out
}

/// Class order, groups and contour radii.
pub fn format_class_table() -> String {
    let mut out = String::new();
    out.push_str("Classe  Grupo  dmax (km)\n");
    for class in ClassCode::ORDER.iter().rev() {
        let key = class.as_str().to_lowercase();
        let radius = RADIUS_TABLE
            .iter()
            .find(|(label, _)| *label == key)
            .map(|(_, rule)| format_rule(rule))
            .unwrap_or_default();
        out.push_str(&format!("{:<7} {:<6} {}\n", class.as_str(), group_of(*class).letter(), radius));
    }

    out.push_str("\nClasses por canal:\n");
    for (label, rule) in RADIUS_TABLE {
        if let RadiusRule::ByChannel(_) = rule {
            out.push_str(&format!("  {:<9} {}\n", label.to_uppercase(), format_rule(rule)));
        }
    }
    out
}

fn format_rule(rule: &RadiusRule) -> String {
    match rule {
        RadiusRule::Flat(km) => format!("{km:.1}"),
        RadiusRule::ByChannel(bands) => bands
            .iter()
            .map(|b| format!("canais {}-{}: {:.1}", b.channels.start, b.channels.end - 1, b.radius_km))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Comparison, period, change kind and payment for a class pair.
pub fn format_class_change(current: &str, proposed: &str) -> String {
    let payment = match payment_required(current, proposed) {
        PaymentRequirement::NoCharge => "sem cobrança",
        PaymentRequirement::Required => "com cobrança",
        PaymentRequirement::NotApplicable => "não se aplica",
    };

    let mut out = String::new();
    out.push_str(&format!("{current} -> {proposed}\n"));
    out.push_str(&format!("Mudança de classe: {:?}\n", compare_classes(current, proposed)));
    out.push_str(&format!("Tcp: {}\n", time_to_promotion(current, proposed)));
    out.push_str(&format!("Tipo de mudança: {:?}\n", change_kind(current, proposed)));
    out.push_str(&format!("Pagamento: {payment}\n"));
    out
}
