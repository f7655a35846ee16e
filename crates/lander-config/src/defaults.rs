//! The built-in landing page used when nothing else is available.

use crate::model::{
    ConfigSnapshot, Feature, Footer, FooterLinks, Header, Hero, Link, PricingTier, SectionCopy,
    Sections, SocialLink, Testimonial, Theme,
};

const ICON_PLACEHOLDER: &str = "/placeholder.svg?height=48&width=48";
const IMAGE_PLACEHOLDER: &str = "/placeholder.svg?height=300&width=400";
const AVATAR_PLACEHOLDER: &str = "/placeholder.svg?height=64&width=64";

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            header: default_header(),
            hero: default_hero(),
            sections: default_sections(),
            features: default_features(),
            pricing: default_pricing(),
            testimonials: default_testimonials(),
            footer: default_footer(),
            theme: default_theme(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_header() -> Header {
    Header {
        brand_name: "LandingBuilder".to_string(),
        brand_initials: "LB".to_string(),
        nav: vec![
            Link::new("Features", "#features"),
            Link::new("Pricing", "#pricing"),
            Link::new("Testimonials", "#testimonials"),
        ],
        cta_label: "Get Started".to_string(),
        cta_href: Some("#pricing".to_string()),
        show_editor_link: Some(true),
    }
}

fn default_hero() -> Hero {
    Hero {
        headline: "Build Beautiful Landing Pages".to_string(),
        subheadline: "Create stunning, professional landing pages in minutes with our no-code builder. No design skills required.".to_string(),
        cta_text: "Get Started Free".to_string(),
        cta_secondary: "View Demo".to_string(),
        cta_primary_href: None,
        cta_secondary_href: None,
        background_image: "/placeholder.svg?height=600&width=1200".to_string(),
        hero_image: "/placeholder.svg?height=400&width=600".to_string(),
    }
}

fn default_sections() -> Sections {
    Sections {
        features: SectionCopy {
            title: "Powerful Features".to_string(),
            subtitle: "Everything you need to create stunning landing pages that convert visitors into customers.".to_string(),
            most_popular_label: None,
        },
        pricing: SectionCopy {
            title: "Simple, Transparent Pricing".to_string(),
            subtitle: "Choose the perfect plan for your needs. All plans include a 14-day free trial.".to_string(),
            most_popular_label: Some("Most Popular".to_string()),
        },
        testimonials: SectionCopy {
            title: "Loved by Thousands of Customers".to_string(),
            subtitle: "See what our customers have to say about building landing pages with us.".to_string(),
            most_popular_label: None,
        },
    }
}

fn default_features() -> Vec<Feature> {
    let feature = |id, title: &str, description: &str| Feature {
        id,
        title: title.to_string(),
        description: description.to_string(),
        icon: ICON_PLACEHOLDER.to_string(),
        image: IMAGE_PLACEHOLDER.to_string(),
    };

    vec![
        feature(
            1,
            "Drag & Drop Builder",
            "Intuitive interface that lets you build pages by simply dragging and dropping elements.",
        ),
        feature(
            2,
            "Professional Templates",
            "Choose from dozens of professionally designed templates for any industry.",
        ),
        feature(
            3,
            "Mobile Responsive",
            "All pages are automatically optimized for mobile, tablet, and desktop devices.",
        ),
    ]
}

fn default_pricing() -> Vec<PricingTier> {
    vec![
        PricingTier {
            id: 1,
            name: "Starter".to_string(),
            price: "$9".to_string(),
            period: "month".to_string(),
            description: "Perfect for individuals and small projects".to_string(),
            features: strings(&[
                "5 Landing Pages",
                "Basic Templates",
                "Mobile Responsive",
                "Email Support",
            ]),
            popular: false,
            cta_text: "Start Free Trial".to_string(),
            cta_href: None,
        },
        PricingTier {
            id: 2,
            name: "Professional".to_string(),
            price: "$29".to_string(),
            period: "month".to_string(),
            description: "Ideal for growing businesses and agencies".to_string(),
            features: strings(&[
                "Unlimited Landing Pages",
                "Premium Templates",
                "Custom Domains",
                "Analytics Dashboard",
                "Priority Support",
            ]),
            popular: true,
            cta_text: "Start Free Trial".to_string(),
            cta_href: None,
        },
        PricingTier {
            id: 3,
            name: "Enterprise".to_string(),
            price: "$99".to_string(),
            period: "month".to_string(),
            description: "For large teams and organizations".to_string(),
            features: strings(&[
                "Everything in Professional",
                "White Label Solution",
                "API Access",
                "Custom Integrations",
                "Dedicated Support",
            ]),
            popular: false,
            cta_text: "Contact Sales".to_string(),
            cta_href: None,
        },
    ]
}

fn default_testimonials() -> Vec<Testimonial> {
    let testimonial = |id, name: &str, role: &str, company: &str, content: &str| Testimonial {
        id,
        name: name.to_string(),
        role: role.to_string(),
        company: company.to_string(),
        content: content.to_string(),
        avatar: AVATAR_PLACEHOLDER.to_string(),
        rating: 5,
    };

    vec![
        testimonial(
            1,
            "Sarah Johnson",
            "Marketing Director",
            "TechStart Inc.",
            "This landing page builder transformed our marketing campaigns. We can now create professional pages in minutes instead of weeks.",
        ),
        testimonial(
            2,
            "Michael Chen",
            "Freelance Designer",
            "Chen Creative",
            "As a designer, I appreciate the attention to detail and the quality of templates. My clients love the results.",
        ),
        testimonial(
            3,
            "Emily Rodriguez",
            "Small Business Owner",
            "Local Bakery",
            "I have zero technical skills, but I was able to create a beautiful landing page for my bakery in under an hour.",
        ),
    ]
}

fn default_footer() -> Footer {
    Footer {
        company_name: "LandingBuilder".to_string(),
        tagline: "Build. Launch. Grow.".to_string(),
        description: "The easiest way to create professional landing pages that convert visitors into customers.".to_string(),
        links: FooterLinks {
            product: vec![
                Link::new("Features", "#features"),
                Link::new("Templates", "#templates"),
                Link::new("Pricing", "#pricing"),
                Link::new("Integrations", "#integrations"),
            ],
            company: vec![
                Link::new("About", "/about"),
                Link::new("Blog", "/blog"),
                Link::new("Careers", "/careers"),
                Link::new("Contact", "/contact"),
            ],
            support: vec![
                Link::new("Help Center", "/help"),
                Link::new("Documentation", "/docs"),
                Link::new("API Reference", "/api"),
                Link::new("Status", "/status"),
            ],
        },
        social_links: ["Twitter", "LinkedIn", "GitHub"]
            .into_iter()
            .map(|name| SocialLink {
                name: name.to_string(),
                href: "#".to_string(),
                icon: name.to_lowercase(),
            })
            .collect(),
    }
}

fn default_theme() -> Theme {
    Theme {
        primary_color: "#059669".to_string(),
        secondary_color: "#10b981".to_string(),
        accent_color: "#d97706".to_string(),
        background_color: "#ffffff".to_string(),
        text_color: "#475569".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{next_id, ItemList};

    #[test]
    fn default_lists_have_unique_sequential_ids() {
        let config = ConfigSnapshot::default();

        assert_eq!(next_id(&config.features), Some(4));
        assert_eq!(next_id(&config.pricing), Some(4));
        assert_eq!(next_id(&config.testimonials), Some(4));
        assert_eq!(config.max_id(ItemList::Testimonials), 3);
    }

    #[test]
    fn default_round_trips_through_json() {
        let config = ConfigSnapshot::default();
        let json = config.to_json_pretty().unwrap();

        assert_eq!(ConfigSnapshot::from_json(&json).unwrap(), config);
    }

    #[test]
    fn exactly_one_tier_is_popular() {
        let config = ConfigSnapshot::default();
        assert_eq!(config.pricing.iter().filter(|t| t.popular).count(), 1);
    }
}
